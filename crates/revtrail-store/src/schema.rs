//! Schema collaborator
//!
//! Reports the columns of a host table and adds the revision counter column
//! when it is missing. Only used when `auto_schema` is enabled.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, invalid_identifier, missing_table, Result};
use revtrail_core::config::is_identifier;
use rusqlite::Connection;

/// One column as reported by `PRAGMA table_info`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

/// Columns of `table`, in declaration order; empty if the table is missing
pub fn describe_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    if !is_identifier(table) {
        return Err(invalid_identifier("table", table));
    }
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .map_err(from_rusqlite)?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                declared_type: row.get(2)?,
                not_null: row.get::<_, i64>(3)? != 0,
                default_value: row.get(4)?,
                primary_key: row.get::<_, i64>(5)? != 0,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(columns)
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)?;
    Ok(count > 0)
}

/// Add `column` as `INTEGER NOT NULL DEFAULT 0` unless it exists
///
/// Returns whether the column was added.
pub fn ensure_revision_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    if !is_identifier(column) {
        return Err(invalid_identifier("column", column));
    }
    let columns = describe_columns(conn, table)?;
    if columns.is_empty() {
        return Err(missing_table(table));
    }
    if columns.iter().any(|c| c.name == column) {
        return Ok(false);
    }

    conn.execute(
        &format!(
            "ALTER TABLE {} ADD COLUMN {} INTEGER NOT NULL DEFAULT 0",
            table, column
        ),
        [],
    )
    .map_err(from_rusqlite)?;
    tracing::info!(table, column, "revision column added");
    Ok(true)
}
