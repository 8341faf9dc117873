//! Uniform view over the three completable record kinds.

use super::challenge::Challenge;
use super::habit::Habit;
use super::task::Task;
use super::user::UserId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Kind of persisted entity, used in lookups and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Habit,
    Task,
    Challenge,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Habit => "habit",
            Self::Task => "task",
            Self::Challenge => "challenge",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Habit, task or challenge as one completable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackableItem {
    Habit(Habit),
    Task(Task),
    Challenge(Challenge),
}

impl TrackableItem {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Habit(habit) => habit.id,
            Self::Task(task) => task.id,
            Self::Challenge(challenge) => challenge.id,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            Self::Habit(habit) => habit.user_id,
            Self::Task(task) => task.user_id,
            Self::Challenge(challenge) => challenge.user_id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Habit(_) => EntityKind::Habit,
            Self::Task(_) => EntityKind::Task,
            Self::Challenge(_) => EntityKind::Challenge,
        }
    }
}

impl From<Habit> for TrackableItem {
    fn from(value: Habit) -> Self {
        Self::Habit(value)
    }
}

impl From<Task> for TrackableItem {
    fn from(value: Task) -> Self {
        Self::Task(value)
    }
}

impl From<Challenge> for TrackableItem {
    fn from(value: Challenge) -> Self {
        Self::Challenge(value)
    }
}
