//! User use-case service.
//!
//! # Responsibility
//! - Create, read and rename users.
//! - Build the dashboard projection and persist stale-streak resets.
//!
//! # Invariants
//! - A dashboard read writes only when the streak actually expired.

use super::error::{require_found, ServiceError, ServiceResult};
use crate::engine::level::{progress_within_level, LevelProgress};
use crate::engine::milestone::{days_to_next_milestone, milestone_reward, streak_message};
use crate::engine::streak::expire_streak;
use crate::model::day::CalendarDay;
use crate::model::item::EntityKind;
use crate::model::user::{UserAggregate, UserId};
use crate::model::validation::{require_text, USER_NAME_MAX_CHARS};
use crate::repo::user_repo::UserRepository;
use log::info;
use serde::Serialize;

/// Read model for the user dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub user: UserAggregate,
    pub progress: LevelProgress,
    /// Daily counters, zeroed when the user was not active on `as_of`.
    pub completed_habits_today: u32,
    pub completed_challenges_today: u32,
    pub streak_message: &'static str,
    pub days_to_next_milestone: Option<u32>,
    /// Highest streak milestone reached, if any.
    pub milestone: Option<u32>,
}

/// User service facade over repository implementations.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a level-1 user with zero XP.
    pub fn create_user(&self, name: &str) -> ServiceResult<UserAggregate> {
        let user = UserAggregate::new(name.trim());
        let id = self.repo.create_user(&user)?;
        info!("event=user_create module=service status=ok");
        self.repo
            .get_user(id)?
            .ok_or(ServiceError::InconsistentState(
                "created user not found in read-back",
            ))
    }

    pub fn get_user(&self, id: UserId) -> ServiceResult<UserAggregate> {
        require_found(self.repo.get_user(id)?, EntityKind::User, id)
    }

    pub fn list_users(&self) -> ServiceResult<Vec<UserAggregate>> {
        Ok(self.repo.list_users()?)
    }

    pub fn rename_user(&self, id: UserId, name: &str) -> ServiceResult<UserAggregate> {
        let name = name.trim();
        require_text("name", name, USER_NAME_MAX_CHARS)?;
        let mut user = self.get_user(id)?;
        user.name = name.to_string();
        self.repo.update_user(&user)?;
        Ok(user)
    }

    /// Loads the dashboard for `id` as seen on `as_of`.
    ///
    /// # Side effects
    /// - Persists `streak = 0` when more than one day passed since the last
    ///   activity and the stored streak was still positive.
    pub fn dashboard(&self, id: UserId, as_of: CalendarDay) -> ServiceResult<Dashboard> {
        let mut user = self.get_user(id)?;

        let expired = expire_streak(user.streak, user.last_active_day, as_of);
        if expired != user.streak {
            info!(
                "event=streak_reset module=service status=ok previous_streak={}",
                user.streak
            );
            user.streak = expired;
            self.repo.update_user(&user)?;
        }

        let active_today = user.last_active_day == Some(as_of);
        let (completed_habits_today, completed_challenges_today) = if active_today {
            (user.completed_habits_today, user.completed_challenges_today)
        } else {
            (0, 0)
        };

        Ok(Dashboard {
            progress: progress_within_level(user.xp, user.level),
            completed_habits_today,
            completed_challenges_today,
            streak_message: streak_message(user.streak),
            days_to_next_milestone: days_to_next_milestone(user.streak),
            milestone: milestone_reward(user.streak).map(|reward| reward.milestone),
            user,
        })
    }
}
