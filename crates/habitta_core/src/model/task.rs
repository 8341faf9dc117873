//! One-off task model.
//!
//! # Invariants
//! - `is_completed` and `completed_on` are set together.
//! - Tasks are hard-deleted; there is no tombstone.

use super::attributes::{Priority, TaskCategory};
use super::day::CalendarDay;
use super::user::UserId;
use super::validation::{
    limit_text, require_text, ValidationError, DESCRIPTION_MAX_CHARS, NAME_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

pub const DEFAULT_TASK_XP_REWARD: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: TaskCategory,
    pub due_day: Option<CalendarDay>,
    pub is_completed: bool,
    pub completed_on: Option<CalendarDay>,
    pub xp_reward: u32,
}

impl Task {
    pub fn new(user_id: UserId, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            category: TaskCategory::default(),
            due_day: None,
            is_completed: false,
            completed_on: None,
            xp_reward: DEFAULT_TASK_XP_REWARD,
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
        Ok(())
    }

    /// Open task whose due day is before `as_of`.
    pub fn is_overdue(&self, as_of: CalendarDay) -> bool {
        !self.is_completed && self.due_day.is_some_and(|due| due < as_of)
    }

    /// Open task due exactly on `as_of`.
    pub fn is_due_on(&self, as_of: CalendarDay) -> bool {
        !self.is_completed && self.due_day == Some(as_of)
    }

    /// Sets or clears completion state outside the XP-awarding path.
    ///
    /// Re-marking a completed task keeps its original completion day.
    pub fn set_completed(&mut self, completed: bool, as_of: CalendarDay) {
        if completed == self.is_completed {
            return;
        }
        self.is_completed = completed;
        self.completed_on = completed.then_some(as_of);
    }
}
