//! Habit use-case service.
//!
//! # Responsibility
//! - Create, update, list and soft-delete habits.
//! - Project per-day status and aggregate statistics for a user.
//!
//! # Invariants
//! - Completion history and streaks are only changed by `CompletionService`;
//!   `update_habit` keeps the stored progress fields.
//! - Day-relative reads report `current_streak` as evaluated on `as_of`,
//!   never the value stored at the last completion.

use super::error::{require_found, ServiceError, ServiceResult};
use crate::engine::streak::evaluate_streak;
use crate::model::day::CalendarDay;
use crate::model::habit::{Habit, HabitId};
use crate::model::item::EntityKind;
use crate::model::user::UserId;
use crate::repo::habit_repo::{HabitListQuery, HabitRepository};
use log::info;
use serde::Serialize;

/// Days covered by `HabitStats::recent_days`, ending on `as_of`.
pub const RECENT_WINDOW_DAYS: u64 = 7;

/// Habit plus its status on the requested day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitView {
    pub habit: Habit,
    pub is_completed_today: bool,
    pub is_scheduled_today: bool,
}

/// Number of habits completed on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub day: CalendarDay,
    pub completed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitStats {
    pub total_habits: u32,
    pub total_completions: u64,
    /// Sum of the current streaks of active habits on `as_of`.
    pub total_streak_days: u64,
    pub longest_streak: u32,
    /// Oldest day first.
    pub recent_days: Vec<DayCount>,
}

/// Habit service facade over repository implementations.
pub struct HabitService<R: HabitRepository> {
    repo: R,
}

impl<R: HabitRepository> HabitService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists a new habit and returns the stored copy.
    pub fn create_habit(&self, habit: &Habit) -> ServiceResult<Habit> {
        let id = self.repo.create_habit(habit)?;
        info!(
            "event=habit_create module=service status=ok difficulty={} scheduled_days={}",
            habit.difficulty.as_str(),
            habit.scheduled_days.bits()
        );
        self.repo
            .get_habit(id, true)?
            .ok_or(ServiceError::InconsistentState(
                "created habit not found in read-back",
            ))
    }

    /// Rewrites descriptive fields of an active habit.
    pub fn update_habit(&self, habit: &Habit) -> ServiceResult<Habit> {
        let stored = self.get_habit(habit.id)?;
        if stored.user_id != habit.user_id {
            return Err(ServiceError::OwnershipMismatch {
                kind: EntityKind::Habit,
                id: habit.id,
            });
        }

        let mut next = habit.clone();
        next.current_streak = stored.current_streak;
        next.longest_streak = stored.longest_streak;
        next.total_completions = stored.total_completions;
        next.last_completed = stored.last_completed;
        next.completions = stored.completions;
        next.is_active = stored.is_active;

        self.repo.update_habit(&next)?;
        Ok(next)
    }

    /// Gets one active habit.
    pub fn get_habit(&self, id: HabitId) -> ServiceResult<Habit> {
        require_found(self.repo.get_habit(id, false)?, EntityKind::Habit, id)
    }

    /// Lists active habits with their status and current streak on `as_of`.
    pub fn list_habits(&self, user_id: UserId, as_of: CalendarDay) -> ServiceResult<Vec<HabitView>> {
        let habits = self.active_habits_as_of(user_id, as_of)?;
        Ok(habits
            .into_iter()
            .map(|habit| HabitView {
                is_completed_today: habit.is_completed_on(as_of),
                is_scheduled_today: habit.is_scheduled_on(as_of),
                habit,
            })
            .collect())
    }

    pub fn delete_habit(&self, id: HabitId) -> ServiceResult<()> {
        self.repo.soft_delete_habit(id)?;
        info!("event=habit_delete module=service status=ok");
        Ok(())
    }

    /// Aggregates active habits of `user_id` as seen on `as_of`.
    pub fn stats(&self, user_id: UserId, as_of: CalendarDay) -> ServiceResult<HabitStats> {
        let habits = self.active_habits_as_of(user_id, as_of)?;

        let recent_days = (0..RECENT_WINDOW_DAYS)
            .rev()
            .filter_map(|offset| as_of.sub_days(offset))
            .map(|day| DayCount {
                day,
                completed: habits
                    .iter()
                    .filter(|habit| habit.is_completed_on(day))
                    .count() as u32,
            })
            .collect();

        Ok(HabitStats {
            total_habits: habits.len() as u32,
            total_completions: habits
                .iter()
                .map(|habit| u64::from(habit.total_completions))
                .sum(),
            total_streak_days: habits
                .iter()
                .map(|habit| u64::from(habit.current_streak))
                .sum(),
            longest_streak: habits
                .iter()
                .map(|habit| habit.longest_streak)
                .max()
                .unwrap_or(0),
            recent_days,
        })
    }

    fn active_habits_as_of(&self, user_id: UserId, as_of: CalendarDay) -> ServiceResult<Vec<Habit>> {
        let mut habits = self.repo.list_habits(&HabitListQuery::active(user_id))?;
        for habit in &mut habits {
            habit.current_streak = evaluate_streak(habit.completion_days(), as_of).current;
        }
        Ok(habits)
    }
}
