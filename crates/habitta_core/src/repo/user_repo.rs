//! User aggregate repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Write paths call `UserAggregate::validate()` before SQL mutations.
//! - Read paths reject rows whose level does not match their XP.

use super::error::{RepoError, RepoResult};
use super::schema::{day_to_db, ensure_connection_ready, parse_optional_day, parse_uuid, TableSpec};
use crate::model::item::EntityKind;
use crate::model::user::{UserAggregate, UserId};
use rusqlite::{params, Connection, Row};

const USER_TABLE: TableSpec = (
    "users",
    &[
        "uuid",
        "name",
        "xp",
        "level",
        "streak",
        "longest_streak",
        "reward_points",
        "last_active_day",
        "completed_habits_today",
        "completed_challenges_today",
    ],
);

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    xp,
    level,
    streak,
    longest_streak,
    reward_points,
    last_active_day,
    completed_habits_today,
    completed_challenges_today
FROM users";

/// Repository interface for user aggregates.
pub trait UserRepository {
    fn create_user(&self, user: &UserAggregate) -> RepoResult<UserId>;
    fn update_user(&self, user: &UserAggregate) -> RepoResult<()>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<UserAggregate>>;
    /// Lists users oldest first.
    fn list_users(&self) -> RepoResult<Vec<UserAggregate>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[USER_TABLE])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &UserAggregate) -> RepoResult<UserId> {
        user.validate()?;

        self.conn.execute(
            "INSERT INTO users (
                uuid,
                name,
                xp,
                level,
                streak,
                longest_streak,
                reward_points,
                last_active_day,
                completed_habits_today,
                completed_challenges_today
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                user.id.to_string(),
                user.name.as_str(),
                count_to_db(user.xp, "xp")?,
                user.level,
                user.streak,
                user.longest_streak,
                count_to_db(user.reward_points, "reward_points")?,
                day_to_db(user.last_active_day),
                user.completed_habits_today,
                user.completed_challenges_today,
            ],
        )?;

        Ok(user.id)
    }

    fn update_user(&self, user: &UserAggregate) -> RepoResult<()> {
        user.validate()?;

        let changed = self.conn.execute(
            "UPDATE users
             SET
                name = ?1,
                xp = ?2,
                level = ?3,
                streak = ?4,
                longest_streak = ?5,
                reward_points = ?6,
                last_active_day = ?7,
                completed_habits_today = ?8,
                completed_challenges_today = ?9,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?10;",
            params![
                user.name.as_str(),
                count_to_db(user.xp, "xp")?,
                user.level,
                user.streak,
                user.longest_streak,
                count_to_db(user.reward_points, "reward_points")?,
                day_to_db(user.last_active_day),
                user.completed_habits_today,
                user.completed_challenges_today,
                user.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::User,
                id: user.id,
            });
        }
        Ok(())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<UserAggregate>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_users(&self) -> RepoResult<Vec<UserAggregate>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<UserAggregate> {
    let uuid_text: String = row.get("uuid")?;

    let user = UserAggregate {
        id: parse_uuid(&uuid_text, "users.uuid")?,
        name: row.get("name")?,
        xp: count_from_db(row.get("xp")?, "xp")?,
        level: row.get("level")?,
        streak: row.get("streak")?,
        longest_streak: row.get("longest_streak")?,
        reward_points: count_from_db(row.get("reward_points")?, "reward_points")?,
        last_active_day: parse_optional_day(row.get("last_active_day")?, "users.last_active_day")?,
        completed_habits_today: row.get("completed_habits_today")?,
        completed_challenges_today: row.get("completed_challenges_today")?,
    };
    user.validate()?;
    Ok(user)
}

fn count_to_db(value: u64, column: &str) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("{column} `{value}` exceeds storage range")))
}

fn count_from_db(value: i64, column: &str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative {column} `{value}` in users.{column}")))
}
