//! Daily challenge model and catalog template.
//!
//! # Invariants
//! - `expires_on` is strictly after `generated_day`.
//! - `is_completed` and `completed_on` are set together.
//! - Challenges are never deleted; they expire.

use super::attributes::{Category, Difficulty};
use super::day::CalendarDay;
use super::user::UserId;
use super::validation::{
    limit_text, require_text, ValidationError, DESCRIPTION_MAX_CHARS, NAME_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ChallengeId = Uuid;

/// Read-only catalog entry a daily challenge is stamped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeTemplate {
    pub title: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub difficulty: Difficulty,
    pub xp_reward: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub difficulty: Difficulty,
    pub xp_reward: u32,
    pub is_completed: bool,
    pub completed_on: Option<CalendarDay>,
    pub is_daily: bool,
    pub generated_day: CalendarDay,
    pub expires_on: CalendarDay,
}

impl Challenge {
    /// Stamps a template for `user_id`, valid from `generated_day` until the
    /// next day.
    pub fn from_template(
        user_id: UserId,
        template: &ChallengeTemplate,
        generated_day: CalendarDay,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: template.title.to_string(),
            description: template.description.to_string(),
            category: template.category,
            difficulty: template.difficulty,
            xp_reward: template.xp_reward,
            is_completed: false,
            completed_on: None,
            is_daily: true,
            generated_day,
            expires_on: generated_day.succ(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() || self.user_id.is_nil() {
            return Err(ValidationError::NilUuid);
        }
        require_text("title", &self.title, NAME_MAX_CHARS)?;
        limit_text("description", &self.description, DESCRIPTION_MAX_CHARS)?;
        if self.is_completed != self.completed_on.is_some() {
            return Err(ValidationError::CompletionStateMismatch);
        }
        if self.expires_on <= self.generated_day {
            return Err(ValidationError::InvalidExpiryWindow {
                generated: self.generated_day,
                expires: self.expires_on,
            });
        }
        Ok(())
    }

    /// A challenge expires at the start of `expires_on`.
    pub fn is_expired(&self, as_of: CalendarDay) -> bool {
        as_of >= self.expires_on
    }
}
