//! Domain model for habits, tasks, challenges and user progress.
//!
//! # Responsibility
//! - Define canonical records consumed by the engine and persisted by repos.
//! - Own per-record invariants through `validate()`.
//!
//! # Invariants
//! - Every record is identified by a non-nil UUID and owned by one user.
//! - Days are `CalendarDay` values; no record stores time of day.

pub mod attributes;
pub mod challenge;
pub mod day;
pub mod habit;
pub mod item;
pub mod task;
pub mod user;
pub mod validation;
