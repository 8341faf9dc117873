//! Daily challenge use-case service.
//!
//! # Responsibility
//! - Serve the day's challenges, generating a batch on first request.
//! - Aggregate challenge statistics.
//!
//! # Invariants
//! - A user receives at most one daily batch per `CalendarDay`.
//! - Sampling uses the caller's rng; the service owns no randomness.

use super::error::{require_found, ServiceResult};
use crate::engine::generator::generate_daily_challenges;
use crate::model::challenge::{Challenge, ChallengeId, ChallengeTemplate};
use crate::model::day::{day_diff, CalendarDay};
use crate::model::item::EntityKind;
use crate::model::user::UserId;
use crate::repo::challenge_repo::ChallengeRepository;
use log::info;
use rand::Rng;
use serde::Serialize;

/// Days counted by `ChallengeStats::recent_generated`, ending on `as_of`.
pub const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChallengeStats {
    pub total: u32,
    pub completed: u32,
    /// Generated within the last seven days.
    pub recent_generated: u32,
    pub recent_completed: u32,
    /// XP of every completed challenge.
    pub total_xp_earned: u64,
    pub completion_rate: f64,
}

/// Challenge service facade over repository implementations.
pub struct ChallengeService<'a, R: ChallengeRepository> {
    repo: R,
    catalog: &'a [ChallengeTemplate],
    daily_count: usize,
}

impl<'a, R: ChallengeRepository> ChallengeService<'a, R> {
    /// `daily_count` is the batch size sampled from `catalog` per day.
    pub fn new(repo: R, catalog: &'a [ChallengeTemplate], daily_count: usize) -> Self {
        Self {
            repo,
            catalog,
            daily_count,
        }
    }

    /// Returns the challenges generated for `user_id` on `as_of`, sampling
    /// and persisting a new batch when the day has none yet.
    pub fn daily_challenges<G>(
        &self,
        user_id: UserId,
        as_of: CalendarDay,
        rng: &mut G,
    ) -> ServiceResult<Vec<Challenge>>
    where
        G: Rng + ?Sized,
    {
        let existing = self.repo.list_daily_challenges(user_id, as_of)?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let candidates =
            generate_daily_challenges(user_id, as_of, self.catalog, self.daily_count, rng);
        let batch = self
            .repo
            .insert_daily_batch_if_absent(user_id, as_of, &candidates)?;
        if batch.inserted {
            info!(
                "event=challenge_generate module=service status=ok count={}",
                batch.challenges.len()
            );
        }
        Ok(batch.challenges)
    }

    pub fn get_challenge(&self, id: ChallengeId) -> ServiceResult<Challenge> {
        require_found(self.repo.get_challenge(id)?, EntityKind::Challenge, id)
    }

    pub fn list_challenges(&self, user_id: UserId) -> ServiceResult<Vec<Challenge>> {
        Ok(self.repo.list_challenges(user_id)?)
    }

    pub fn stats(&self, user_id: UserId, as_of: CalendarDay) -> ServiceResult<ChallengeStats> {
        let challenges = self.repo.list_challenges(user_id)?;
        let is_recent = |challenge: &Challenge| {
            let age = day_diff(as_of, challenge.generated_day);
            (0..RECENT_WINDOW_DAYS).contains(&age)
        };

        let total = challenges.len() as u32;
        let completed = challenges.iter().filter(|c| c.is_completed).count() as u32;
        let completion_rate = if total == 0 {
            0.0
        } else {
            f64::from(completed) / f64::from(total)
        };

        Ok(ChallengeStats {
            total,
            completed,
            recent_generated: challenges.iter().filter(|c| is_recent(c)).count() as u32,
            recent_completed: challenges
                .iter()
                .filter(|c| c.is_completed && is_recent(c))
                .count() as u32,
            total_xp_earned: challenges
                .iter()
                .filter(|c| c.is_completed)
                .map(|c| u64::from(c.xp_reward))
                .sum(),
            completion_rate,
        })
    }
}
