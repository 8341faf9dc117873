//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define record-store contracts for users, habits, tasks and challenges.
//! - Isolate SQLite query details from services and the progress engine.
//!
//! # Invariants
//! - Repository writes enforce the model `validate()` before persistence.
//! - Repository reads reject invalid persisted state instead of masking it.
//! - Repositories only accept connections migrated to the latest schema.

pub mod challenge_repo;
pub mod error;
pub mod habit_repo;
mod schema;
pub mod task_repo;
pub mod user_repo;

pub use error::{RepoError, RepoResult};
