//! Completion transaction and user progress post-step.
//!
//! # Responsibility
//! - Decide whether an item can be completed on a day.
//! - Produce the updated item and the XP award for one completion.
//! - Fold an award into the owning user's aggregate.
//!
//! # Invariants
//! - Inputs are never mutated; callers persist the returned records.
//! - A rejected completion returns the item unchanged with zero XP.
//! - Habit streak bonus is capped at `MAX_STREAK_BONUS_XP`.
//! - `level` is recomputed from `xp` on every aggregate update.

use super::level::level_for_xp;
use super::streak::{advance_streak, evaluate_streak};
use crate::model::attributes::Difficulty;
use crate::model::day::CalendarDay;
use crate::model::habit::{CompletionRecord, Habit};
use crate::model::item::TrackableItem;
use crate::model::user::UserAggregate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const STREAK_BONUS_PER_DAY: u32 = 2;
pub const MAX_STREAK_BONUS_XP: u32 = 20;

/// Outcome of one completion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOutcome {
    Completed,
    /// Habit already has a record for the day, or the flag is already set.
    AlreadyCompleted,
    /// Day's weekday is not in the habit schedule.
    NotScheduledToday,
    /// Habit was soft-deleted.
    Inactive,
    /// Challenge is past its expiry day.
    Expired,
}

/// Result of `complete_item`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub outcome: CompletionOutcome,
    pub xp_earned: u32,
    /// Habit streaks after the attempt; zero for tasks and challenges.
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Updated item on success, the untouched input otherwise.
    pub item: TrackableItem,
}

impl Completion {
    pub fn is_completed(&self) -> bool {
        self.outcome == CompletionOutcome::Completed
    }

    fn rejected(outcome: CompletionOutcome, item: &TrackableItem) -> Self {
        let (current_streak, longest_streak) = match item {
            TrackableItem::Habit(habit) => (habit.current_streak, habit.longest_streak),
            _ => (0, 0),
        };
        Self {
            outcome,
            xp_earned: 0,
            current_streak,
            longest_streak,
            item: item.clone(),
        }
    }
}

/// Base habit XP per difficulty tier.
pub fn base_xp_for_difficulty(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 10,
        Difficulty::Medium => 20,
        Difficulty::Hard => 35,
        Difficulty::Extreme => 50,
    }
}

pub fn streak_bonus(current_streak: u32) -> u32 {
    current_streak
        .saturating_mul(STREAK_BONUS_PER_DAY)
        .min(MAX_STREAK_BONUS_XP)
}

/// Returns the rejection a completion on `as_of` would hit, if any.
pub fn completion_blocker(item: &TrackableItem, as_of: CalendarDay) -> Option<CompletionOutcome> {
    match item {
        TrackableItem::Habit(habit) => {
            if !habit.is_active {
                Some(CompletionOutcome::Inactive)
            } else if habit.is_completed_on(as_of) {
                Some(CompletionOutcome::AlreadyCompleted)
            } else if !habit.is_scheduled_on(as_of) {
                Some(CompletionOutcome::NotScheduledToday)
            } else {
                None
            }
        }
        TrackableItem::Task(task) => task
            .is_completed
            .then_some(CompletionOutcome::AlreadyCompleted),
        TrackableItem::Challenge(challenge) => {
            if challenge.is_completed {
                Some(CompletionOutcome::AlreadyCompleted)
            } else if challenge.is_expired(as_of) {
                Some(CompletionOutcome::Expired)
            } else {
                None
            }
        }
    }
}

pub fn can_complete_today(item: &TrackableItem, as_of: CalendarDay) -> bool {
    completion_blocker(item, as_of).is_none()
}

/// Completes `item` on `as_of`.
///
/// Habits append a completion record, recompute streaks from history and
/// earn `base_xp_for_difficulty + streak_bonus`. Tasks and challenges flip
/// their completion flag and earn their flat `xp_reward`.
pub fn complete_item(item: &TrackableItem, as_of: CalendarDay, note: Option<&str>) -> Completion {
    if let Some(outcome) = completion_blocker(item, as_of) {
        return Completion::rejected(outcome, item);
    }

    match item {
        TrackableItem::Habit(habit) => complete_habit(habit, as_of, note),
        TrackableItem::Task(task) => {
            let mut next = task.clone();
            next.is_completed = true;
            next.completed_on = Some(as_of);
            Completion {
                outcome: CompletionOutcome::Completed,
                xp_earned: next.xp_reward,
                current_streak: 0,
                longest_streak: 0,
                item: TrackableItem::Task(next),
            }
        }
        TrackableItem::Challenge(challenge) => {
            let mut next = challenge.clone();
            next.is_completed = true;
            next.completed_on = Some(as_of);
            Completion {
                outcome: CompletionOutcome::Completed,
                xp_earned: next.xp_reward,
                current_streak: 0,
                longest_streak: 0,
                item: TrackableItem::Challenge(next),
            }
        }
    }
}

fn complete_habit(habit: &Habit, as_of: CalendarDay, note: Option<&str>) -> Completion {
    let mut next = habit.clone();
    next.insert_completion(CompletionRecord::new(as_of, note));

    let summary = evaluate_streak(next.completion_days(), as_of);
    next.current_streak = summary.current;
    next.longest_streak = next.longest_streak.max(summary.longest);
    next.total_completions = next.total_completions.saturating_add(1);
    next.last_completed = next.last_completed.max(Some(as_of));

    let xp_earned = base_xp_for_difficulty(next.difficulty) + streak_bonus(next.current_streak);
    Completion {
        outcome: CompletionOutcome::Completed,
        xp_earned,
        current_streak: next.current_streak,
        longest_streak: next.longest_streak,
        item: TrackableItem::Habit(next),
    }
}

/// What produced a user activity; drives the per-day counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySource {
    Habit,
    Task,
    Challenge,
    XpGrant,
}

/// Folds one activity worth `xp_earned` on `as_of` into `user`.
///
/// The user streak advances with `advance_streak`. Daily counters restart
/// when `as_of` is a later day than the last activity.
pub fn apply_user_activity(
    user: &UserAggregate,
    as_of: CalendarDay,
    xp_earned: u32,
    source: ActivitySource,
) -> UserAggregate {
    let mut next = user.clone();
    let is_new_day = user.last_active_day.map_or(true, |last| as_of > last);

    next.streak = advance_streak(user.streak, user.last_active_day, as_of);
    next.longest_streak = next.longest_streak.max(next.streak);
    next.xp = user.xp.saturating_add(u64::from(xp_earned));
    next.level = level_for_xp(next.xp);

    if is_new_day {
        next.last_active_day = Some(as_of);
        next.completed_habits_today = 0;
        next.completed_challenges_today = 0;
    }
    match source {
        ActivitySource::Habit => {
            next.completed_habits_today = next.completed_habits_today.saturating_add(1);
        }
        ActivitySource::Challenge => {
            next.completed_challenges_today = next.completed_challenges_today.saturating_add(1);
        }
        ActivitySource::Task | ActivitySource::XpGrant => {}
    }
    next
}

/// Rejected direct XP grant amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidAmount(pub i64);

impl Display for InvalidAmount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "xp amount must be a positive integer, got {}", self.0)
    }
}

impl Error for InvalidAmount {}

/// Grants `amount` XP directly, counting as activity on `as_of`.
///
/// # Errors
/// - `InvalidAmount` when `amount <= 0` or exceeds `u32::MAX`.
pub fn grant_xp(
    user: &UserAggregate,
    as_of: CalendarDay,
    amount: i64,
) -> Result<UserAggregate, InvalidAmount> {
    let xp = u32::try_from(amount)
        .ok()
        .filter(|value| *value > 0)
        .ok_or(InvalidAmount(amount))?;
    Ok(apply_user_activity(user, as_of, xp, ActivitySource::XpGrant))
}

#[cfg(test)]
mod tests {
    use super::{
        apply_user_activity, base_xp_for_difficulty, can_complete_today, complete_item,
        grant_xp, streak_bonus, ActivitySource, CompletionOutcome, InvalidAmount,
    };
    use crate::model::attributes::Difficulty;
    use crate::model::challenge::{Challenge, ChallengeTemplate};
    use crate::model::day::CalendarDay;
    use crate::model::habit::{CompletionRecord, Habit, ScheduledDays};
    use crate::model::item::TrackableItem;
    use crate::model::task::Task;
    use crate::model::user::UserAggregate;
    use uuid::Uuid;

    fn day(value: &str) -> CalendarDay {
        value.parse().unwrap()
    }

    fn habit_item(habit: Habit) -> TrackableItem {
        TrackableItem::Habit(habit)
    }

    fn unwrap_habit(item: TrackableItem) -> Habit {
        match item {
            TrackableItem::Habit(habit) => habit,
            other => panic!("expected habit, got {other:?}"),
        }
    }

    #[test]
    fn first_habit_completion_starts_streak() {
        let habit = Habit::new(Uuid::new_v4(), "meditate");
        let result = complete_item(&habit_item(habit), day("2024-01-03"), Some("calm"));

        assert_eq!(result.outcome, CompletionOutcome::Completed);
        assert_eq!(result.xp_earned, 20 + 2);
        assert_eq!((result.current_streak, result.longest_streak), (1, 1));

        let updated = unwrap_habit(result.item);
        assert_eq!(updated.total_completions, 1);
        assert_eq!(updated.last_completed, Some(day("2024-01-03")));
        assert_eq!(updated.completions[0].note.as_deref(), Some("calm"));
    }

    #[test]
    fn second_completion_same_day_is_rejected_without_changes() {
        let habit = Habit::new(Uuid::new_v4(), "meditate");
        let first = complete_item(&habit_item(habit), day("2024-01-03"), None);
        let second = complete_item(&first.item, day("2024-01-03"), None);

        assert_eq!(second.outcome, CompletionOutcome::AlreadyCompleted);
        assert_eq!(second.xp_earned, 0);
        assert_eq!(second.current_streak, first.current_streak);
        assert_eq!(second.item, first.item);
    }

    #[test]
    fn unscheduled_weekday_is_rejected() {
        let mut habit = Habit::new(Uuid::new_v4(), "gym");
        habit.scheduled_days = ScheduledDays::from_weekdays(&[1, 3, 5]).unwrap();
        let item = habit_item(habit);

        // 2024-01-02 is a Tuesday.
        assert!(!can_complete_today(&item, day("2024-01-02")));
        let result = complete_item(&item, day("2024-01-02"), None);
        assert_eq!(result.outcome, CompletionOutcome::NotScheduledToday);
        assert!(can_complete_today(&item, day("2024-01-03")));
    }

    #[test]
    fn inactive_habit_is_rejected() {
        let mut habit = Habit::new(Uuid::new_v4(), "old");
        habit.soft_delete();
        let result = complete_item(&habit_item(habit), day("2024-01-03"), None);
        assert_eq!(result.outcome, CompletionOutcome::Inactive);
    }

    #[test]
    fn streak_bonus_is_capped() {
        let mut habit = Habit::new(Uuid::new_v4(), "run");
        habit.difficulty = Difficulty::Hard;
        let start = day("2024-01-01");
        for offset in 0..15 {
            habit.insert_completion(CompletionRecord::new(start.add_days(offset).unwrap(), None));
        }
        habit.current_streak = 15;
        habit.longest_streak = 15;

        let result = complete_item(&habit_item(habit), start.add_days(15).unwrap(), None);
        assert_eq!(result.current_streak, 16);
        assert_eq!(result.xp_earned, 35 + 20);
        assert_eq!(streak_bonus(15), 20);
        assert_eq!(streak_bonus(3), 6);
    }

    #[test]
    fn longest_streak_never_decreases_after_gap() {
        let mut habit = Habit::new(Uuid::new_v4(), "write");
        habit.insert_completion(CompletionRecord::new(day("2024-01-01"), None));
        habit.insert_completion(CompletionRecord::new(day("2024-01-02"), None));
        habit.current_streak = 0;
        habit.longest_streak = 9;

        let result = complete_item(&habit_item(habit), day("2024-01-10"), None);
        assert_eq!((result.current_streak, result.longest_streak), (1, 9));
    }

    #[test]
    fn base_xp_table() {
        assert_eq!(base_xp_for_difficulty(Difficulty::Easy), 10);
        assert_eq!(base_xp_for_difficulty(Difficulty::Medium), 20);
        assert_eq!(base_xp_for_difficulty(Difficulty::Hard), 35);
        assert_eq!(base_xp_for_difficulty(Difficulty::Extreme), 50);
    }

    #[test]
    fn task_completion_is_flat_and_idempotent() {
        let task = Task::new(Uuid::new_v4(), "file taxes");
        let first = complete_item(&TrackableItem::Task(task), day("2024-04-01"), None);
        assert_eq!(first.outcome, CompletionOutcome::Completed);
        assert_eq!(first.xp_earned, 5);

        let second = complete_item(&first.item, day("2024-04-02"), None);
        assert_eq!(second.outcome, CompletionOutcome::AlreadyCompleted);
        assert_eq!(second.xp_earned, 0);
    }

    #[test]
    fn expired_challenge_is_rejected() {
        let template = ChallengeTemplate {
            title: "Cold Shower",
            description: "Take a cold shower",
            category: crate::model::attributes::Category::Health,
            difficulty: Difficulty::Hard,
            xp_reward: 20,
        };
        let challenge = Challenge::from_template(Uuid::new_v4(), &template, day("2024-01-01"));
        let item = TrackableItem::Challenge(challenge);

        let on_time = complete_item(&item, day("2024-01-01"), None);
        assert_eq!(on_time.outcome, CompletionOutcome::Completed);
        assert_eq!(on_time.xp_earned, 20);

        let late = complete_item(&item, day("2024-01-02"), None);
        assert_eq!(late.outcome, CompletionOutcome::Expired);
    }

    #[test]
    fn user_activity_updates_streak_xp_and_level() {
        let user = UserAggregate::new("ada");
        let first = apply_user_activity(&user, day("2024-01-01"), 60, ActivitySource::Habit);
        assert_eq!((first.streak, first.longest_streak), (1, 1));
        assert_eq!((first.xp, first.level), (60, 1));
        assert_eq!(first.completed_habits_today, 1);

        let same_day = apply_user_activity(&first, day("2024-01-01"), 50, ActivitySource::Challenge);
        assert_eq!(same_day.streak, 1);
        assert_eq!((same_day.xp, same_day.level), (110, 2));
        assert_eq!(same_day.completed_habits_today, 1);
        assert_eq!(same_day.completed_challenges_today, 1);

        let next_day = apply_user_activity(&same_day, day("2024-01-02"), 5, ActivitySource::Task);
        assert_eq!((next_day.streak, next_day.longest_streak), (2, 2));
        assert_eq!(next_day.completed_habits_today, 0);
        assert_eq!(next_day.completed_challenges_today, 0);

        let after_gap = apply_user_activity(&next_day, day("2024-01-05"), 5, ActivitySource::Task);
        assert_eq!((after_gap.streak, after_gap.longest_streak), (1, 2));
        assert_eq!(after_gap.last_active_day, Some(day("2024-01-05")));
        assert!(after_gap.validate().is_ok());
    }

    #[test]
    fn grant_xp_rejects_non_positive_amounts() {
        let user = UserAggregate::new("ada");
        assert_eq!(grant_xp(&user, day("2024-01-01"), 0), Err(InvalidAmount(0)));
        assert_eq!(grant_xp(&user, day("2024-01-01"), -5), Err(InvalidAmount(-5)));

        let granted = grant_xp(&user, day("2024-01-01"), 300).unwrap();
        assert_eq!((granted.xp, granted.level, granted.streak), (300, 3, 1));
    }
}
