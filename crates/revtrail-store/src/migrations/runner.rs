//! Migration runner
//!
//! Applies migrations in order, each in its own transaction. Already-applied
//! migrations are skipped after their checksum is verified.

#![allow(clippy::result_large_err)]

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};
use crate::migrations::checksums::compute_checksum;
use crate::migrations::Migration;
use rusqlite::{Connection, OptionalExtension};

/// Apply all pending migrations to the database
pub fn apply_migrations(conn: &mut Connection, migrations: &[Migration]) -> Result<()> {
    create_schema_version_table(conn)?;

    for migration in migrations {
        apply_migration(conn, &migration.id, &migration.sql)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist
fn create_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY,
            migration_id TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL,
            checksum TEXT
        )",
        [],
    )
    .map_err(from_rusqlite)?;

    Ok(())
}

/// Apply a single migration if not already applied
fn apply_migration(conn: &mut Connection, migration_id: &str, sql: &str) -> Result<()> {
    let checksum = compute_checksum(sql);

    let recorded: Option<Option<String>> = conn
        .query_row(
            "SELECT checksum FROM schema_version WHERE migration_id = ?",
            [migration_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;

    match recorded {
        Some(Some(existing)) if existing != checksum => {
            return Err(checksum_mismatch(migration_id, &existing, &checksum));
        }
        Some(_) => {
            tracing::debug!(migration_id, "migration already applied");
            return Ok(());
        }
        None => {}
    }

    let tx = conn.transaction().map_err(from_rusqlite)?;

    tx.execute_batch(sql)
        .map_err(|e| migration_error(migration_id, &e.to_string()))?;

    let now = chrono::Utc::now().timestamp();
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?, ?, ?)",
        rusqlite::params![migration_id, now, checksum],
    )
    .map_err(from_rusqlite)?;

    tx.commit().map_err(from_rusqlite)?;
    tracing::info!(migration_id, "migration applied");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migration(id: &str, sql: &str) -> Migration {
        Migration {
            id: id.to_string(),
            sql: sql.to_string(),
        }
    }

    #[test]
    fn test_apply_and_reapply() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrations = vec![migration("001_things", "CREATE TABLE things (id INTEGER);")];

        apply_migrations(&mut conn, &migrations).unwrap();
        apply_migrations(&mut conn, &migrations).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_changed_sql_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(
            &mut conn,
            &[migration("001_things", "CREATE TABLE things (id INTEGER);")],
        )
        .unwrap();

        let err = apply_migrations(
            &mut conn,
            &[migration("001_things", "CREATE TABLE things (id TEXT);")],
        )
        .unwrap_err();
        assert_eq!(err.code(), "ERR_INVARIANT_VIOLATION");
    }

    #[test]
    fn test_failed_migration_leaves_no_record() {
        let mut conn = Connection::open_in_memory().unwrap();
        let err = apply_migrations(
            &mut conn,
            &[migration("001_broken", "CREATE TABLE ok (id INTEGER); NOT SQL;")],
        )
        .unwrap_err();
        assert_eq!(err.op(), Some("migration"));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
