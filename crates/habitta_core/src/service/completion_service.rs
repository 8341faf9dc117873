//! Transactional completion and XP grant use-cases.
//!
//! # Responsibility
//! - Run load, engine step and persistence for one item and its owner inside
//!   a single `IMMEDIATE` transaction.
//! - Translate engine rejections into typed service errors.
//!
//! # Invariants
//! - Either the item and the user aggregate are both written, or neither is.
//! - A rejected completion writes nothing.
//! - Concurrent completions on one database serialize on the write lock.

use super::error::{require_found, ServiceError, ServiceResult};
use crate::engine::completion::{
    apply_user_activity, complete_item, grant_xp, ActivitySource, Completion, CompletionOutcome,
};
use crate::engine::milestone::{milestone_reward, MilestoneReward};
use crate::model::challenge::ChallengeId;
use crate::model::day::CalendarDay;
use crate::model::habit::HabitId;
use crate::model::item::{EntityKind, TrackableItem};
use crate::model::task::TaskId;
use crate::model::user::{UserAggregate, UserId};
use crate::repo::challenge_repo::{ChallengeRepository, SqliteChallengeRepository};
use crate::repo::habit_repo::{HabitRepository, SqliteHabitRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;

/// Persisted result of a successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub completion: Completion,
    /// Owner aggregate after the post-step.
    pub user: UserAggregate,
    pub leveled_up: bool,
    /// Habit streak milestone reached exactly on this completion. Its
    /// `reward_points` are already added to `user`.
    pub milestone: Option<MilestoneReward>,
}

/// Completion service bound to one SQLite connection.
pub struct CompletionService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> CompletionService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Completes an active habit scheduled on `as_of`.
    ///
    /// # Errors
    /// - `Inactive`, `AlreadyCompleted` or `NotScheduledToday` from the engine.
    /// - `NotFound` when the habit or its owner is missing.
    pub fn complete_habit(
        &mut self,
        id: HabitId,
        as_of: CalendarDay,
        note: Option<&str>,
    ) -> ServiceResult<CompletionReport> {
        self.in_transaction("habit_complete", |tx| {
            let habits = SqliteHabitRepository::try_new(tx)?;
            let habit = require_found(habits.get_habit(id, true)?, EntityKind::Habit, id)?;
            complete_and_persist(tx, habit.into(), as_of, note, ActivitySource::Habit)
        })
    }

    pub fn complete_task(&mut self, id: TaskId, as_of: CalendarDay) -> ServiceResult<CompletionReport> {
        self.in_transaction("task_complete", |tx| {
            let tasks = SqliteTaskRepository::try_new(tx)?;
            let task = require_found(tasks.get_task(id)?, EntityKind::Task, id)?;
            complete_and_persist(tx, task.into(), as_of, None, ActivitySource::Task)
        })
    }

    /// Completes a challenge that has not yet expired on `as_of`.
    pub fn complete_challenge(
        &mut self,
        id: ChallengeId,
        as_of: CalendarDay,
    ) -> ServiceResult<CompletionReport> {
        self.in_transaction("challenge_complete", |tx| {
            let challenges = SqliteChallengeRepository::try_new(tx)?;
            let challenge =
                require_found(challenges.get_challenge(id)?, EntityKind::Challenge, id)?;
            complete_and_persist(tx, challenge.into(), as_of, None, ActivitySource::Challenge)
        })
    }

    /// Grants `amount` XP to `user_id` as activity on `as_of`.
    ///
    /// # Errors
    /// - `InvalidAmount` when `amount <= 0`.
    pub fn grant_xp(
        &mut self,
        user_id: UserId,
        as_of: CalendarDay,
        amount: i64,
    ) -> ServiceResult<UserAggregate> {
        self.in_transaction("xp_grant", |tx| {
            let users = SqliteUserRepository::try_new(tx)?;
            let user = require_found(users.get_user(user_id)?, EntityKind::User, user_id)?;
            let next = grant_xp(&user, as_of, amount)
                .map_err(|invalid| ServiceError::InvalidAmount(invalid.0))?;
            users.update_user(&next)?;
            Ok(next)
        })
    }

    fn in_transaction<T>(
        &mut self,
        event: &'static str,
        op: impl FnOnce(&Transaction<'_>) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let started_at = Instant::now();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        match op(&tx) {
            Ok(value) => {
                tx.commit()?;
                info!(
                    "event={event} module=service status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                warn!(
                    "event={event} module=service status=rejected duration_ms={} error_code={}",
                    started_at.elapsed().as_millis(),
                    error_code(&err)
                );
                Err(err)
            }
        }
    }
}

fn complete_and_persist(
    conn: &Connection,
    item: TrackableItem,
    as_of: CalendarDay,
    note: Option<&str>,
    source: ActivitySource,
) -> ServiceResult<CompletionReport> {
    let completion = complete_item(&item, as_of, note);
    reject_unless_completed(&completion, as_of)?;

    let milestone = match &completion.item {
        TrackableItem::Habit(habit) => {
            let habits = SqliteHabitRepository::try_new(conn)?;
            let record = habit
                .completions
                .iter()
                .find(|record| record.day == as_of)
                .ok_or(ServiceError::InconsistentState(
                    "completed habit is missing the new record",
                ))?;
            if !habits.insert_completion(habit.id, record)? {
                return Err(ServiceError::AlreadyCompleted {
                    kind: EntityKind::Habit,
                    id: habit.id,
                });
            }
            habits.update_habit(habit)?;
            milestone_reward(habit.current_streak).filter(|reward| reward.is_new)
        }
        TrackableItem::Task(task) => {
            SqliteTaskRepository::try_new(conn)?.update_task(task)?;
            None
        }
        TrackableItem::Challenge(challenge) => {
            SqliteChallengeRepository::try_new(conn)?.update_challenge(challenge)?;
            None
        }
    };

    let users = SqliteUserRepository::try_new(conn)?;
    let user_id = item.user_id();
    let user = require_found(users.get_user(user_id)?, EntityKind::User, user_id)?;
    let mut next = apply_user_activity(&user, as_of, completion.xp_earned, source);
    if let Some(reward) = milestone {
        next.reward_points = next
            .reward_points
            .saturating_add(u64::from(reward.reward_points));
    }
    users.update_user(&next)?;

    Ok(CompletionReport {
        leveled_up: next.level > user.level,
        user: next,
        milestone,
        completion,
    })
}

fn reject_unless_completed(completion: &Completion, as_of: CalendarDay) -> ServiceResult<()> {
    let kind = completion.item.kind();
    let id = completion.item.id();
    match completion.outcome {
        CompletionOutcome::Completed => Ok(()),
        CompletionOutcome::AlreadyCompleted => Err(ServiceError::AlreadyCompleted { kind, id }),
        CompletionOutcome::NotScheduledToday => {
            Err(ServiceError::NotScheduledToday { id, day: as_of })
        }
        CompletionOutcome::Inactive => Err(ServiceError::Inactive(id)),
        CompletionOutcome::Expired => {
            let expires_on = match &completion.item {
                TrackableItem::Challenge(challenge) => challenge.expires_on,
                _ => as_of,
            };
            Err(ServiceError::Expired { id, expires_on })
        }
    }
}

fn error_code(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::NotFound { .. } => "not_found",
        ServiceError::AlreadyCompleted { .. } => "already_completed",
        ServiceError::NotScheduledToday { .. } => "not_scheduled_today",
        ServiceError::Inactive(_) => "inactive",
        ServiceError::Expired { .. } => "expired",
        ServiceError::InvalidAmount(_) => "invalid_amount",
        ServiceError::OwnershipMismatch { .. } => "ownership_mismatch",
        ServiceError::Validation(_) => "validation",
        ServiceError::Repo(_) => "repo",
        ServiceError::InconsistentState(_) => "inconsistent_state",
    }
}
