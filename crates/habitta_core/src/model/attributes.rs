//! Closed vocabularies shared by habits, tasks and challenges.
//!
//! `as_str`/`parse` pairs are the storage and CLI spelling and always match
//! the serde names.

use serde::{Deserialize, Serialize};

/// Effort tier of a habit or challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Extreme,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Extreme => "extreme",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            "extreme" => Some(Self::Extreme),
            _ => None,
        }
    }
}

/// Life area a habit or challenge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Health,
    Fitness,
    Mindset,
    Learning,
    Productivity,
    Social,
    Creative,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Fitness => "fitness",
            Self::Mindset => "mindset",
            Self::Learning => "learning",
            Self::Productivity => "productivity",
            Self::Social => "social",
            Self::Creative => "creative",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "health" => Some(Self::Health),
            "fitness" => Some(Self::Fitness),
            "mindset" => Some(Self::Mindset),
            "learning" => Some(Self::Learning),
            "productivity" => Some(Self::Productivity),
            "social" => Some(Self::Social),
            "creative" => Some(Self::Creative),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Intended cadence of a habit. Informational; scheduling uses weekdays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

/// Urgency of a one-off task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

/// Bucket a one-off task is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    #[default]
    Personal,
    Work,
    Health,
    Learning,
    Shopping,
    Other,
}

impl TaskCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Work => "work",
            Self::Health => "health",
            Self::Learning => "learning",
            Self::Shopping => "shopping",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "personal" => Some(Self::Personal),
            "work" => Some(Self::Work),
            "health" => Some(Self::Health),
            "learning" => Some(Self::Learning),
            "shopping" => Some(Self::Shopping),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}
