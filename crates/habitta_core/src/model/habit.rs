//! Habit domain model.
//!
//! # Responsibility
//! - Define the recurring trackable item and its completion history.
//! - Provide schedule and soft-delete helpers.
//!
//! # Invariants
//! - `completions` is strictly ascending by day (at most one record per day).
//! - `current_streak <= longest_streak`.
//! - `scheduled_days` is never empty.
//! - Deletion flips `is_active`; history is retained.

use super::attributes::{Category, Difficulty, Frequency};
use super::day::CalendarDay;
use super::user::UserId;
use super::validation::{
    limit_text, require_color, require_text, ValidationError, DESCRIPTION_MAX_CHARS,
    NAME_MAX_CHARS, NOTE_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type HabitId = Uuid;

pub const DEFAULT_HABIT_COLOR: &str = "#8B5CF6";
pub const DEFAULT_HABIT_ICON: &str = "star";
pub const DEFAULT_HABIT_XP_REWARD: u32 = 10;

const ALL_WEEKDAYS_MASK: u8 = 0b111_1111;

/// Set of weekdays (`0 = Sunday`) a habit is due on, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct ScheduledDays(u8);

impl ScheduledDays {
    pub const EVERY_DAY: Self = Self(ALL_WEEKDAYS_MASK);

    /// Builds a schedule from weekday numbers; duplicates are folded.
    pub fn from_weekdays(days: &[u8]) -> Result<Self, ValidationError> {
        let mut mask = 0u8;
        for &day in days {
            if day > 6 {
                return Err(ValidationError::InvalidWeekday(day));
            }
            mask |= 1 << day;
        }
        Self::from_bits(mask)
    }

    /// Rebuilds a schedule from its persisted bitmask.
    pub fn from_bits(bits: u8) -> Result<Self, ValidationError> {
        if bits == 0 {
            return Err(ValidationError::EmptySchedule);
        }
        if bits & !ALL_WEEKDAYS_MASK != 0 {
            return Err(ValidationError::InvalidWeekday(7));
        }
        Ok(Self(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, weekday: u8) -> bool {
        weekday < 7 && self.0 & (1 << weekday) != 0
    }

    pub fn includes(self, day: CalendarDay) -> bool {
        self.contains(day.weekday())
    }

    /// Ascending weekday numbers.
    pub fn weekdays(self) -> Vec<u8> {
        (0..7).filter(|day| self.contains(*day)).collect()
    }
}

impl Default for ScheduledDays {
    fn default() -> Self {
        Self::EVERY_DAY
    }
}

impl TryFrom<Vec<u8>> for ScheduledDays {
    type Error = ValidationError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_weekdays(&value)
    }
}

impl From<ScheduledDays> for Vec<u8> {
    fn from(value: ScheduledDays) -> Self {
        value.weekdays()
    }
}

/// One day on which a habit was completed, with an optional reflection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub day: CalendarDay,
    pub note: Option<String>,
}

impl CompletionRecord {
    /// Blank notes are stored as `None`.
    pub fn new(day: CalendarDay, note: Option<&str>) -> Self {
        let note = note
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Self { day, note }
    }
}

/// Recurring trackable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub user_id: UserId,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub difficulty: Difficulty,
    pub frequency: Frequency,
    pub scheduled_days: ScheduledDays,
    /// Display reward. Completion XP is derived from `difficulty`.
    pub xp_reward: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completions: u32,
    pub last_completed: Option<CalendarDay>,
    pub completions: Vec<CompletionRecord>,
    pub is_active: bool,
    pub color: String,
    pub icon: String,
}

impl Habit {
    /// Creates an active habit with a generated ID and default attributes.
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            description: String::new(),
            category: Category::default(),
            difficulty: Difficulty::default(),
            frequency: Frequency::default(),
            scheduled_days: ScheduledDays::default(),
            xp_reward: DEFAULT_HABIT_XP_REWARD,
            current_streak: 0,
            longest_streak: 0,
            total_completions: 0,
            last_completed: None,
            completions: Vec::new(),
            is_active: true,
            color: DEFAULT_HABIT_COLOR.to_string(),
            icon: DEFAULT_HABIT_ICON.to_string(),
        }
    }

    /// Creates a habit with a caller-provided ID.
    ///
    /// # Errors
    /// - `ValidationError::NilUuid` when `id` is nil.
    pub fn with_id(
        id: HabitId,
        user_id: UserId,
        name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if id.is_nil() {
            return Err(ValidationError::NilUuid);
        }
        let mut habit = Self::new(user_id, name);
        habit.id = id;
        Ok(habit)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() || self.user_id.is_nil() {
            return Err(ValidationError::NilUuid);
        }
        require_text("name", &self.name, NAME_MAX_CHARS)?;
        limit_text("description", &self.description, DESCRIPTION_MAX_CHARS)?;
        require_color(&self.color)?;
        require_text("icon", &self.icon, NAME_MAX_CHARS)?;

        if self.current_streak > self.longest_streak {
            return Err(ValidationError::StreakExceedsLongest {
                current: self.current_streak,
                longest: self.longest_streak,
            });
        }

        let mut previous: Option<CalendarDay> = None;
        for record in &self.completions {
            if previous.is_some_and(|day| day >= record.day) {
                return Err(ValidationError::UnorderedCompletions(record.day));
            }
            if let Some(note) = &record.note {
                limit_text("note", note, NOTE_MAX_CHARS)?;
            }
            previous = Some(record.day);
        }

        Ok(())
    }

    pub fn is_scheduled_on(&self, day: CalendarDay) -> bool {
        self.scheduled_days.includes(day)
    }

    pub fn is_completed_on(&self, day: CalendarDay) -> bool {
        self.completions
            .binary_search_by_key(&day, |record| record.day)
            .is_ok()
    }

    pub fn completion_days(&self) -> impl Iterator<Item = CalendarDay> + '_ {
        self.completions.iter().map(|record| record.day)
    }

    /// Inserts a record keeping ascending day order.
    ///
    /// Returns `false` without changes when the day is already recorded.
    pub fn insert_completion(&mut self, record: CompletionRecord) -> bool {
        match self
            .completions
            .binary_search_by_key(&record.day, |existing| existing.day)
        {
            Ok(_) => false,
            Err(index) => {
                self.completions.insert(index, record);
                true
            }
        }
    }

    pub fn soft_delete(&mut self) {
        self.is_active = false;
    }

    pub fn restore(&mut self) {
        self.is_active = true;
    }
}

#[cfg(test)]
mod tests {
    use super::{CompletionRecord, Habit, ScheduledDays};
    use crate::model::day::CalendarDay;
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    fn day(value: &str) -> CalendarDay {
        value.parse().unwrap()
    }

    #[test]
    fn schedule_rejects_empty_and_out_of_range() {
        assert_eq!(
            ScheduledDays::from_weekdays(&[]),
            Err(ValidationError::EmptySchedule)
        );
        assert_eq!(
            ScheduledDays::from_weekdays(&[1, 9]),
            Err(ValidationError::InvalidWeekday(9))
        );
        let schedule = ScheduledDays::from_weekdays(&[5, 1, 3, 1]).unwrap();
        assert_eq!(schedule.weekdays(), vec![1, 3, 5]);
        assert_eq!(ScheduledDays::from_bits(schedule.bits()), Ok(schedule));
    }

    #[test]
    fn schedule_serializes_as_weekday_list() {
        let schedule = ScheduledDays::from_weekdays(&[0, 6]).unwrap();
        let json = serde_json::to_value(schedule).unwrap();
        assert_eq!(json, serde_json::json!([0, 6]));
        assert!(serde_json::from_value::<ScheduledDays>(serde_json::json!([])).is_err());
    }

    #[test]
    fn insert_completion_keeps_order_and_rejects_duplicates() {
        let mut habit = Habit::new(Uuid::new_v4(), "read");
        assert!(habit.insert_completion(CompletionRecord::new(day("2024-05-03"), None)));
        assert!(habit.insert_completion(CompletionRecord::new(day("2024-05-01"), Some("  "))));
        assert!(!habit.insert_completion(CompletionRecord::new(day("2024-05-03"), Some("again"))));

        let days: Vec<_> = habit.completion_days().collect();
        assert_eq!(days, vec![day("2024-05-01"), day("2024-05-03")]);
        assert_eq!(habit.completions[0].note, None);
        assert!(habit.is_completed_on(day("2024-05-03")));
        assert!(habit.validate().is_ok());
    }

    #[test]
    fn validate_rejects_streak_above_longest_and_bad_color() {
        let mut habit = Habit::new(Uuid::new_v4(), "stretch");
        habit.current_streak = 3;
        habit.longest_streak = 2;
        assert!(matches!(
            habit.validate(),
            Err(ValidationError::StreakExceedsLongest { .. })
        ));

        habit.longest_streak = 3;
        habit.color = "purple".to_string();
        assert!(matches!(
            habit.validate(),
            Err(ValidationError::InvalidColor(_))
        ));
    }
}
