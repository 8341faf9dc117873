//! Core domain logic for Habitta.
//! This crate is the single source of truth for streak, XP and level rules.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, HabittaConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use engine::completion::{complete_item, Completion, CompletionOutcome};
pub use engine::level::{level_for_xp, progress_within_level, LevelProgress};
pub use engine::streak::{evaluate_streak, StreakSummary};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::day::{CalendarDay, DayBoundary};
pub use model::item::{EntityKind, TrackableItem};
pub use repo::{RepoError, RepoResult};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
