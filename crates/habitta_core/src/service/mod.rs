//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and engine steps into use-case APIs.
//! - Keep the CLI decoupled from storage details.

pub mod challenge_service;
pub mod completion_service;
pub mod error;
pub mod habit_service;
pub mod task_service;
pub mod user_service;

pub use error::{ServiceError, ServiceResult};
