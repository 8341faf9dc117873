//! Habit repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist habit rows and their completion history.
//! - Hydrate habits with completions in ascending day order.
//!
//! # Invariants
//! - Write paths call `Habit::validate()` before SQL mutations.
//! - `(habit_uuid, day)` is unique; a second record for the same day is
//!   reported as not inserted instead of failing.
//! - Soft-deleted habits are hidden unless `include_inactive` is set.

use super::error::{RepoError, RepoResult};
use super::schema::{
    bool_to_int, day_to_db, ensure_connection_ready, parse_day, parse_enum, parse_flag,
    parse_optional_day, parse_uuid, TableSpec,
};
use crate::model::attributes::{Category, Difficulty, Frequency};
use crate::model::habit::{CompletionRecord, Habit, HabitId, ScheduledDays};
use crate::model::item::EntityKind;
use crate::model::user::UserId;
use rusqlite::{params, Connection, Row};

const HABIT_TABLES: [TableSpec; 2] = [
    (
        "habits",
        &[
            "uuid",
            "user_uuid",
            "name",
            "description",
            "category",
            "difficulty",
            "frequency",
            "scheduled_days",
            "xp_reward",
            "current_streak",
            "longest_streak",
            "total_completions",
            "last_completed_day",
            "is_active",
            "color",
            "icon",
        ],
    ),
    ("habit_completions", &["habit_uuid", "day", "note"]),
];

const HABIT_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    name,
    description,
    category,
    difficulty,
    frequency,
    scheduled_days,
    xp_reward,
    current_streak,
    longest_streak,
    total_completions,
    last_completed_day,
    is_active,
    color,
    icon
FROM habits";

/// Query options for listing a user's habits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitListQuery {
    pub user_id: UserId,
    pub include_inactive: bool,
}

impl HabitListQuery {
    pub fn active(user_id: UserId) -> Self {
        Self {
            user_id,
            include_inactive: false,
        }
    }
}

/// Repository interface for habits and their completion history.
pub trait HabitRepository {
    /// Inserts the habit row and every record in `habit.completions`.
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId>;
    /// Rewrites habit columns. Completion history is left untouched.
    fn update_habit(&self, habit: &Habit) -> RepoResult<()>;
    fn get_habit(&self, id: HabitId, include_inactive: bool) -> RepoResult<Option<Habit>>;
    /// Lists habits oldest first.
    fn list_habits(&self, query: &HabitListQuery) -> RepoResult<Vec<Habit>>;
    fn soft_delete_habit(&self, id: HabitId) -> RepoResult<()>;
    /// Appends one completion record. Returns `false` when the day is taken.
    fn insert_completion(&self, id: HabitId, record: &CompletionRecord) -> RepoResult<bool>;
}

/// SQLite-backed habit repository.
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &HABIT_TABLES)?;
        Ok(Self { conn })
    }

    fn load_completions(&self, habit_uuid: &str) -> RepoResult<Vec<CompletionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT day, note
             FROM habit_completions
             WHERE habit_uuid = ?1
             ORDER BY day ASC;",
        )?;
        let mut rows = stmt.query([habit_uuid])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let day: String = row.get("day")?;
            records.push(CompletionRecord {
                day: parse_day(&day, "habit_completions.day")?,
                note: row.get("note")?,
            });
        }
        Ok(records)
    }

    fn hydrate(&self, row: &Row<'_>) -> RepoResult<Habit> {
        let uuid_text: String = row.get("uuid")?;
        let mut habit = parse_habit_row(row)?;
        habit.completions = self.load_completions(&uuid_text)?;
        habit.validate()?;
        Ok(habit)
    }
}

impl HabitRepository for SqliteHabitRepository<'_> {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        habit.validate()?;

        self.conn.execute(
            "INSERT INTO habits (
                uuid,
                user_uuid,
                name,
                description,
                category,
                difficulty,
                frequency,
                scheduled_days,
                xp_reward,
                current_streak,
                longest_streak,
                total_completions,
                last_completed_day,
                is_active,
                color,
                icon
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16);",
            params![
                habit.id.to_string(),
                habit.user_id.to_string(),
                habit.name.as_str(),
                habit.description.as_str(),
                habit.category.as_str(),
                habit.difficulty.as_str(),
                habit.frequency.as_str(),
                habit.scheduled_days.bits(),
                habit.xp_reward,
                habit.current_streak,
                habit.longest_streak,
                habit.total_completions,
                day_to_db(habit.last_completed),
                bool_to_int(habit.is_active),
                habit.color.as_str(),
                habit.icon.as_str(),
            ],
        )?;

        for record in &habit.completions {
            self.insert_completion(habit.id, record)?;
        }
        Ok(habit.id)
    }

    fn update_habit(&self, habit: &Habit) -> RepoResult<()> {
        habit.validate()?;

        let changed = self.conn.execute(
            "UPDATE habits
             SET
                name = ?1,
                description = ?2,
                category = ?3,
                difficulty = ?4,
                frequency = ?5,
                scheduled_days = ?6,
                xp_reward = ?7,
                current_streak = ?8,
                longest_streak = ?9,
                total_completions = ?10,
                last_completed_day = ?11,
                is_active = ?12,
                color = ?13,
                icon = ?14,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?15;",
            params![
                habit.name.as_str(),
                habit.description.as_str(),
                habit.category.as_str(),
                habit.difficulty.as_str(),
                habit.frequency.as_str(),
                habit.scheduled_days.bits(),
                habit.xp_reward,
                habit.current_streak,
                habit.longest_streak,
                habit.total_completions,
                day_to_db(habit.last_completed),
                bool_to_int(habit.is_active),
                habit.color.as_str(),
                habit.icon.as_str(),
                habit.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Habit,
                id: habit.id,
            });
        }
        Ok(())
    }

    fn get_habit(&self, id: HabitId, include_inactive: bool) -> RepoResult<Option<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HABIT_SELECT_SQL}
             WHERE uuid = ?1
               AND (?2 = 1 OR is_active = 1);"
        ))?;
        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_inactive)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.hydrate(row)?));
        }
        Ok(None)
    }

    fn list_habits(&self, query: &HabitListQuery) -> RepoResult<Vec<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HABIT_SELECT_SQL}
             WHERE user_uuid = ?1
               AND (?2 = 1 OR is_active = 1)
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query(params![
            query.user_id.to_string(),
            bool_to_int(query.include_inactive)
        ])?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            habits.push(self.hydrate(row)?);
        }
        Ok(habits)
    }

    fn soft_delete_habit(&self, id: HabitId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE habits
             SET
                is_active = 0,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_active = 1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Habit,
                id,
            });
        }
        Ok(())
    }

    fn insert_completion(&self, id: HabitId, record: &CompletionRecord) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO habit_completions (habit_uuid, day, note)
             VALUES (?1, ?2, ?3);",
            params![id.to_string(), record.day.to_string(), record.note.as_deref()],
        )?;
        Ok(inserted == 1)
    }
}

fn parse_habit_row(row: &Row<'_>) -> RepoResult<Habit> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let category: String = row.get("category")?;
    let difficulty: String = row.get("difficulty")?;
    let frequency: String = row.get("frequency")?;
    let schedule_bits: i64 = row.get("scheduled_days")?;

    let scheduled_days = u8::try_from(schedule_bits)
        .ok()
        .and_then(|bits| ScheduledDays::from_bits(bits).ok())
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid schedule mask `{schedule_bits}` in habits.scheduled_days"
            ))
        })?;

    Ok(Habit {
        id: parse_uuid(&uuid_text, "habits.uuid")?,
        user_id: parse_uuid(&user_text, "habits.user_uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
        category: parse_enum(&category, "habits.category", Category::parse)?,
        difficulty: parse_enum(&difficulty, "habits.difficulty", Difficulty::parse)?,
        frequency: parse_enum(&frequency, "habits.frequency", Frequency::parse)?,
        scheduled_days,
        xp_reward: row.get("xp_reward")?,
        current_streak: row.get("current_streak")?,
        longest_streak: row.get("longest_streak")?,
        total_completions: row.get("total_completions")?,
        last_completed: parse_optional_day(
            row.get("last_completed_day")?,
            "habits.last_completed_day",
        )?,
        completions: Vec::new(),
        is_active: parse_flag(row.get("is_active")?, "habits.is_active")?,
        color: row.get("color")?,
        icon: row.get("icon")?,
    })
}
