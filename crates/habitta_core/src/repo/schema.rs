//! Connection readiness checks and column codecs shared by repositories.

use super::error::{RepoError, RepoResult};
use crate::db::migrations::latest_version;
use crate::model::day::CalendarDay;
use rusqlite::Connection;
use uuid::Uuid;

/// Table name plus the columns a repository reads or writes.
pub(crate) type TableSpec = (&'static str, &'static [&'static str]);

/// Verifies that `conn` is migrated and exposes every table/column in `specs`.
pub(crate) fn ensure_connection_ready(conn: &Connection, specs: &[TableSpec]) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in specs {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        let present = table_columns(conn, table)?;
        for &column in columns {
            if !present.iter().any(|name| name == column) {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_day(value: &str, column: &str) -> RepoResult<CalendarDay> {
    value
        .parse()
        .map_err(|_| RepoError::InvalidData(format!("invalid day value `{value}` in {column}")))
}

pub(crate) fn parse_optional_day(
    value: Option<String>,
    column: &str,
) -> RepoResult<Option<CalendarDay>> {
    value.map(|text| parse_day(&text, column)).transpose()
}

/// Decodes an enum column through its `parse` function.
pub(crate) fn parse_enum<T>(
    value: &str,
    column: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> RepoResult<T> {
    parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid value `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

pub(crate) fn day_to_db(day: Option<CalendarDay>) -> Option<String> {
    day.map(|value| value.to_string())
}
