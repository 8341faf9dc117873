//! Task repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Tasks are hard-deleted; there is no tombstone.

use super::error::{RepoError, RepoResult};
use super::schema::{
    bool_to_int, day_to_db, ensure_connection_ready, parse_enum, parse_flag, parse_optional_day,
    parse_uuid, TableSpec,
};
use crate::model::attributes::{Priority, TaskCategory};
use crate::model::item::EntityKind;
use crate::model::task::{Task, TaskId};
use crate::model::user::UserId;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TASK_TABLE: TableSpec = (
    "tasks",
    &[
        "uuid",
        "user_uuid",
        "title",
        "description",
        "priority",
        "category",
        "due_day",
        "is_completed",
        "completed_on",
        "xp_reward",
    ],
);

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    title,
    description,
    priority,
    category,
    due_day,
    is_completed,
    completed_on,
    xp_reward
FROM tasks";

/// Completion-state filter for task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl TaskFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "completed" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// Query options for listing a user's tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListQuery {
    pub user_id: UserId,
    pub filter: TaskFilter,
}

/// Repository interface for task CRUD operations.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists tasks oldest first.
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[TASK_TABLE])?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                uuid,
                user_uuid,
                title,
                description,
                priority,
                category,
                due_day,
                is_completed,
                completed_on,
                xp_reward
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                task.id.to_string(),
                task.user_id.to_string(),
                task.title.as_str(),
                task.description.as_str(),
                task.priority.as_str(),
                task.category.as_str(),
                day_to_db(task.due_day),
                bool_to_int(task.is_completed),
                day_to_db(task.completed_on),
                task.xp_reward,
            ],
        )?;

        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                priority = ?3,
                category = ?4,
                due_day = ?5,
                is_completed = ?6,
                completed_on = ?7,
                xp_reward = ?8,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?9;",
            params![
                task.title.as_str(),
                task.description.as_str(),
                task.priority.as_str(),
                task.category.as_str(),
                day_to_db(task.due_day),
                bool_to_int(task.is_completed),
                day_to_db(task.completed_on),
                task.xp_reward,
                task.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Task,
                id: task.id,
            });
        }
        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE user_uuid = ?");
        let mut bind_values = vec![Value::Text(query.user_id.to_string())];

        match query.filter {
            TaskFilter::All => {}
            TaskFilter::Completed => {
                sql.push_str(" AND is_completed = ?");
                bind_values.push(Value::Integer(1));
            }
            TaskFilter::Pending => {
                sql.push_str(" AND is_completed = ?");
                bind_values.push(Value::Integer(0));
            }
        }
        sql.push_str(" ORDER BY created_at ASC, rowid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Task,
                id,
            });
        }
        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let priority: String = row.get("priority")?;
    let category: String = row.get("category")?;

    let task = Task {
        id: parse_uuid(&uuid_text, "tasks.uuid")?,
        user_id: parse_uuid(&user_text, "tasks.user_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        priority: parse_enum(&priority, "tasks.priority", Priority::parse)?,
        category: parse_enum(&category, "tasks.category", TaskCategory::parse)?,
        due_day: parse_optional_day(row.get("due_day")?, "tasks.due_day")?,
        is_completed: parse_flag(row.get("is_completed")?, "tasks.is_completed")?,
        completed_on: parse_optional_day(row.get("completed_on")?, "tasks.completed_on")?,
        xp_reward: row.get("xp_reward")?,
    };
    task.validate()?;
    Ok(task)
}
