//! Per-user progress rollup.
//!
//! # Invariants
//! - `level == level_for_xp(xp)` at all times.
//! - `streak <= longest_streak`.
//! - `streak` counts days with any qualifying activity and is independent of
//!   per-habit streaks.

use super::day::CalendarDay;
use super::validation::{require_text, ValidationError, USER_NAME_MAX_CHARS};
use crate::engine::level::level_for_xp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAggregate {
    pub id: UserId,
    pub name: String,
    pub xp: u64,
    pub level: u32,
    pub streak: u32,
    pub longest_streak: u32,
    /// Points collected from streak milestones.
    pub reward_points: u64,
    pub last_active_day: Option<CalendarDay>,
    pub completed_habits_today: u32,
    pub completed_challenges_today: u32,
}

impl UserAggregate {
    /// Creates a level-1 user with no activity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            xp: 0,
            level: 1,
            streak: 0,
            longest_streak: 0,
            reward_points: 0,
            last_active_day: None,
            completed_habits_today: 0,
            completed_challenges_today: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilUuid);
        }
        require_text("name", &self.name, USER_NAME_MAX_CHARS)?;

        let expected = level_for_xp(self.xp);
        if self.level != expected {
            return Err(ValidationError::LevelMismatch {
                xp: self.xp,
                level: self.level,
                expected,
            });
        }
        if self.streak > self.longest_streak {
            return Err(ValidationError::StreakExceedsLongest {
                current: self.streak,
                longest: self.longest_streak,
            });
        }
        Ok(())
    }
}
