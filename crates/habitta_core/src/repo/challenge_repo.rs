//! Challenge repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist generated challenges and their completion state.
//! - Insert a user's daily batch at most once per generated day.
//!
//! # Invariants
//! - Write paths call `Challenge::validate()` before SQL mutations.
//! - `insert_daily_batch_if_absent` checks and inserts inside one
//!   `IMMEDIATE` transaction, so concurrent callers observe one batch.

use super::error::{RepoError, RepoResult};
use super::schema::{
    bool_to_int, day_to_db, ensure_connection_ready, parse_day, parse_enum, parse_flag,
    parse_optional_day, parse_uuid, TableSpec,
};
use crate::model::attributes::{Category, Difficulty};
use crate::model::challenge::{Challenge, ChallengeId};
use crate::model::day::CalendarDay;
use crate::model::item::EntityKind;
use crate::model::user::UserId;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const CHALLENGE_TABLE: TableSpec = (
    "challenges",
    &[
        "uuid",
        "user_uuid",
        "title",
        "description",
        "category",
        "difficulty",
        "xp_reward",
        "is_completed",
        "completed_on",
        "is_daily",
        "generated_day",
        "expires_on",
    ],
);

const CHALLENGE_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    title,
    description,
    category,
    difficulty,
    xp_reward,
    is_completed,
    completed_on,
    is_daily,
    generated_day,
    expires_on
FROM challenges";

/// Result of a daily batch insertion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBatch {
    pub challenges: Vec<Challenge>,
    /// `false` when the day already had challenges and `candidates` were dropped.
    pub inserted: bool,
}

/// Repository interface for challenges.
pub trait ChallengeRepository {
    fn create_challenge(&self, challenge: &Challenge) -> RepoResult<ChallengeId>;
    fn update_challenge(&self, challenge: &Challenge) -> RepoResult<()>;
    fn get_challenge(&self, id: ChallengeId) -> RepoResult<Option<Challenge>>;
    /// Daily challenges generated for `user_id` on `day`.
    fn list_daily_challenges(&self, user_id: UserId, day: CalendarDay)
        -> RepoResult<Vec<Challenge>>;
    /// Every challenge of `user_id`, newest generated day first.
    fn list_challenges(&self, user_id: UserId) -> RepoResult<Vec<Challenge>>;
    /// Persists `candidates` unless `user_id` already has daily challenges
    /// for `day`, in which case the existing ones are returned.
    fn insert_daily_batch_if_absent(
        &self,
        user_id: UserId,
        day: CalendarDay,
        candidates: &[Challenge],
    ) -> RepoResult<DailyBatch>;
}

/// SQLite-backed challenge repository.
pub struct SqliteChallengeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChallengeRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[CHALLENGE_TABLE])?;
        Ok(Self { conn })
    }
}

impl ChallengeRepository for SqliteChallengeRepository<'_> {
    fn create_challenge(&self, challenge: &Challenge) -> RepoResult<ChallengeId> {
        insert_challenge(self.conn, challenge)
    }

    fn update_challenge(&self, challenge: &Challenge) -> RepoResult<()> {
        challenge.validate()?;

        let changed = self.conn.execute(
            "UPDATE challenges
             SET
                title = ?1,
                description = ?2,
                category = ?3,
                difficulty = ?4,
                xp_reward = ?5,
                is_completed = ?6,
                completed_on = ?7,
                is_daily = ?8,
                generated_day = ?9,
                expires_on = ?10,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?11;",
            params![
                challenge.title.as_str(),
                challenge.description.as_str(),
                challenge.category.as_str(),
                challenge.difficulty.as_str(),
                challenge.xp_reward,
                bool_to_int(challenge.is_completed),
                day_to_db(challenge.completed_on),
                bool_to_int(challenge.is_daily),
                challenge.generated_day.to_string(),
                challenge.expires_on.to_string(),
                challenge.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Challenge,
                id: challenge.id,
            });
        }
        Ok(())
    }

    fn get_challenge(&self, id: ChallengeId) -> RepoResult<Option<Challenge>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHALLENGE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_challenge_row(row)?));
        }
        Ok(None)
    }

    fn list_daily_challenges(
        &self,
        user_id: UserId,
        day: CalendarDay,
    ) -> RepoResult<Vec<Challenge>> {
        select_daily(self.conn, user_id, day)
    }

    fn list_challenges(&self, user_id: UserId) -> RepoResult<Vec<Challenge>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CHALLENGE_SELECT_SQL}
             WHERE user_uuid = ?1
             ORDER BY generated_day DESC, created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut challenges = Vec::new();
        while let Some(row) = rows.next()? {
            challenges.push(parse_challenge_row(row)?);
        }
        Ok(challenges)
    }

    fn insert_daily_batch_if_absent(
        &self,
        user_id: UserId,
        day: CalendarDay,
        candidates: &[Challenge],
    ) -> RepoResult<DailyBatch> {
        if let Some(stray) = candidates
            .iter()
            .find(|challenge| challenge.user_id != user_id || challenge.generated_day != day)
        {
            return Err(RepoError::InvalidData(format!(
                "challenge {} does not belong to the requested daily batch",
                stray.id
            )));
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let existing = select_daily(&tx, user_id, day)?;
        if !existing.is_empty() {
            tx.commit()?;
            return Ok(DailyBatch {
                challenges: existing,
                inserted: false,
            });
        }

        for challenge in candidates {
            insert_challenge(&tx, challenge)?;
        }
        tx.commit()?;

        Ok(DailyBatch {
            challenges: candidates.to_vec(),
            inserted: true,
        })
    }
}

fn insert_challenge(conn: &Connection, challenge: &Challenge) -> RepoResult<ChallengeId> {
    challenge.validate()?;

    conn.execute(
        "INSERT INTO challenges (
            uuid,
            user_uuid,
            title,
            description,
            category,
            difficulty,
            xp_reward,
            is_completed,
            completed_on,
            is_daily,
            generated_day,
            expires_on
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
        params![
            challenge.id.to_string(),
            challenge.user_id.to_string(),
            challenge.title.as_str(),
            challenge.description.as_str(),
            challenge.category.as_str(),
            challenge.difficulty.as_str(),
            challenge.xp_reward,
            bool_to_int(challenge.is_completed),
            day_to_db(challenge.completed_on),
            bool_to_int(challenge.is_daily),
            challenge.generated_day.to_string(),
            challenge.expires_on.to_string(),
        ],
    )?;

    Ok(challenge.id)
}

fn select_daily(conn: &Connection, user_id: UserId, day: CalendarDay) -> RepoResult<Vec<Challenge>> {
    let mut stmt = conn.prepare(&format!(
        "{CHALLENGE_SELECT_SQL}
         WHERE user_uuid = ?1
           AND generated_day = ?2
           AND is_daily = 1
         ORDER BY created_at ASC, rowid ASC;"
    ))?;
    let mut rows = stmt.query(params![user_id.to_string(), day.to_string()])?;
    let mut challenges = Vec::new();
    while let Some(row) = rows.next()? {
        challenges.push(parse_challenge_row(row)?);
    }
    Ok(challenges)
}

fn parse_challenge_row(row: &Row<'_>) -> RepoResult<Challenge> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let category: String = row.get("category")?;
    let difficulty: String = row.get("difficulty")?;
    let generated_day: String = row.get("generated_day")?;
    let expires_on: String = row.get("expires_on")?;

    let challenge = Challenge {
        id: parse_uuid(&uuid_text, "challenges.uuid")?,
        user_id: parse_uuid(&user_text, "challenges.user_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        category: parse_enum(&category, "challenges.category", Category::parse)?,
        difficulty: parse_enum(&difficulty, "challenges.difficulty", Difficulty::parse)?,
        xp_reward: row.get("xp_reward")?,
        is_completed: parse_flag(row.get("is_completed")?, "challenges.is_completed")?,
        completed_on: parse_optional_day(row.get("completed_on")?, "challenges.completed_on")?,
        is_daily: parse_flag(row.get("is_daily")?, "challenges.is_daily")?,
        generated_day: parse_day(&generated_day, "challenges.generated_day")?,
        expires_on: parse_day(&expires_on, "challenges.expires_on")?,
    };
    challenge.validate()?;
    Ok(challenge)
}
