//! Audit table definitions
//!
//! The revision and change record tables are named by configuration and use
//! the payload format's column type, so their migrations are generated rather
//! than embedded. Migration ids carry the table names, which lets several
//! differently configured trails share one database.

#![allow(clippy::result_large_err)]

use crate::errors::Result;
use crate::migrations::runner::apply_migrations;
use revtrail_core::PaperTrail;
use rusqlite::Connection;

/// Migration metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub id: String,
    pub sql: String,
}

/// Migrations creating the audit tables for `trail`
pub fn audit_migrations(trail: &PaperTrail) -> Vec<Migration> {
    let config = trail.config();
    let payload = trail.format().column_type();
    let revisions = &config.revision_table;
    let changes = &config.revision_change_table;

    vec![
        Migration {
            id: format!("001_create_{}", revisions),
            sql: format!(
                "CREATE TABLE IF NOT EXISTS {revisions} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    model TEXT NOT NULL,
                    document {payload} NOT NULL,
                    operation TEXT NOT NULL,
                    document_id TEXT NOT NULL,
                    revision INTEGER NOT NULL,
                    actor_id TEXT,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{revisions}_document
                    ON {revisions} (model, document_id, revision);"
            ),
        },
        Migration {
            id: format!("002_create_{}", changes),
            sql: format!(
                "CREATE TABLE IF NOT EXISTS {changes} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    path TEXT NOT NULL,
                    document {payload} NOT NULL,
                    diff {payload} NOT NULL,
                    revision_id INTEGER REFERENCES {revisions} (id),
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{changes}_revision
                    ON {changes} (revision_id);"
            ),
        },
    ]
}

/// Create the audit tables for `trail`
///
/// The change record table is created even when change records are disabled
/// so the setting can be turned on later without a migration.
pub fn define_models(conn: &mut Connection, trail: &PaperTrail) -> Result<()> {
    apply_migrations(conn, &audit_migrations(trail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use revtrail_core::TrailConfig;

    #[test]
    fn test_migration_ids_follow_table_names() {
        let trail = PaperTrail::new(TrailConfig {
            revision_table: "audit".to_string(),
            revision_change_table: "audit_changes".to_string(),
            ..TrailConfig::default()
        })
        .unwrap();

        let ids: Vec<String> = audit_migrations(&trail).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["001_create_audit", "002_create_audit_changes"]);
    }

    #[test]
    fn test_payload_column_type_follows_format() {
        let constrained = PaperTrail::new(TrailConfig {
            constrained_storage: true,
            ..TrailConfig::default()
        })
        .unwrap();
        let sql = &audit_migrations(&constrained)[0].sql;
        assert!(sql.contains("document TEXT NOT NULL"));

        let structured = PaperTrail::new(TrailConfig::default()).unwrap();
        let sql = &audit_migrations(&structured)[0].sql;
        assert!(sql.contains("document JSON NOT NULL"));
    }
}
