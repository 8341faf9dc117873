//! Shared model validation errors and field checks.
//!
//! # Invariants
//! - Length limits are counted in Unicode scalar values, not bytes.
//! - Every model `validate()` reports the first violated rule only.

use super::day::CalendarDay;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const NAME_MAX_CHARS: usize = 100;
pub const USER_NAME_MAX_CHARS: usize = 50;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const NOTE_MAX_CHARS: usize = 500;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid hex color regex"));

/// Violation of a model invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifiers must not be the nil UUID.
    NilUuid,
    /// Required text field is empty after trimming.
    EmptyField(&'static str),
    /// Text field exceeds its maximum length.
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// Color is not `#RRGGBB`.
    InvalidColor(String),
    /// Habit schedule has no weekday.
    EmptySchedule,
    /// Weekday outside `0..=6`.
    InvalidWeekday(u8),
    /// Completion history is not strictly ascending by day.
    UnorderedCompletions(CalendarDay),
    /// Current streak exceeds the recorded longest streak.
    StreakExceedsLongest { current: u32, longest: u32 },
    /// Completion flag and completion day disagree.
    CompletionStateMismatch,
    /// Challenge expiry is not after its generation day.
    InvalidExpiryWindow {
        generated: CalendarDay,
        expires: CalendarDay,
    },
    /// Stored level does not match the level derived from XP.
    LevelMismatch { xp: u64, level: u32, expected: u32 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "uuid must not be nil"),
            Self::EmptyField(field) => write!(f, "{field} must not be empty"),
            Self::TooLong { field, max, actual } => {
                write!(f, "{field} has {actual} chars, maximum is {max}")
            }
            Self::InvalidColor(value) => write!(f, "color `{value}` must match #RRGGBB"),
            Self::EmptySchedule => write!(f, "schedule must contain at least one weekday"),
            Self::InvalidWeekday(value) => write!(f, "weekday {value} is outside 0..=6"),
            Self::UnorderedCompletions(day) => {
                write!(f, "completion history is not strictly ascending at {day}")
            }
            Self::StreakExceedsLongest { current, longest } => write!(
                f,
                "current streak ({current}) must be <= longest streak ({longest})"
            ),
            Self::CompletionStateMismatch => {
                write!(f, "is_completed and completed_on must be set together")
            }
            Self::InvalidExpiryWindow { generated, expires } => write!(
                f,
                "expires_on ({expires}) must be after generated_day ({generated})"
            ),
            Self::LevelMismatch {
                xp,
                level,
                expected,
            } => write!(f, "level {level} does not match xp {xp} (expected {expected})"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    limit_text(field, value, max)
}

pub(crate) fn limit_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

pub(crate) fn require_color(value: &str) -> Result<(), ValidationError> {
    if HEX_COLOR_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidColor(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{limit_text, require_color, require_text, ValidationError};

    #[test]
    fn require_text_rejects_blank_and_counts_chars() {
        assert_eq!(
            require_text("name", "   ", 10),
            Err(ValidationError::EmptyField("name"))
        );
        assert!(require_text("name", "ééé", 3).is_ok());
        assert!(matches!(
            limit_text("name", "abcd", 3),
            Err(ValidationError::TooLong { actual: 4, .. })
        ));
    }

    #[test]
    fn color_requires_six_hex_digits() {
        assert!(require_color("#8B5CF6").is_ok());
        assert!(require_color("#8b5cf6").is_ok());
        assert!(require_color("8B5CF6").is_err());
        assert!(require_color("#8B5CF").is_err());
    }
}
