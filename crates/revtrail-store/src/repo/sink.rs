//! Transaction-bound revision sink
//!
//! Writes revision and change rows through the caller's transaction. The
//! sink only borrows the transaction; committing or rolling back stays with
//! the caller, so a failed change insert takes the revision down with it.

use crate::errors::sink_error;
use revtrail_core::errors::{Result, TrailError};
use revtrail_core::{ChangeId, NewChangeRecord, NewRevision, Payload, RevisionId, RevisionSink, TrailConfig};
use rusqlite::types::ToSql;
use rusqlite::{Connection, Transaction};

pub struct TxSink<'a> {
    conn: &'a Connection,
    revision_table: &'a str,
    change_table: &'a str,
}

impl<'a> TxSink<'a> {
    pub fn new(tx: &'a Transaction<'_>, config: &'a TrailConfig) -> Self {
        Self {
            conn: tx,
            revision_table: &config.revision_table,
            change_table: &config.revision_change_table,
        }
    }
}

/// Bind a payload: structured values through rusqlite's JSON support, text as is
fn payload_param(payload: &Payload) -> &dyn ToSql {
    match payload {
        Payload::Structured(value) => value,
        Payload::Text(text) => text,
    }
}

impl RevisionSink for TxSink<'_> {
    fn save_revision(&mut self, revision: &NewRevision) -> Result<RevisionId> {
        let sql = format!(
            "INSERT INTO {} (model, document, operation, document_id, revision, actor_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            self.revision_table
        );
        self.conn
            .execute(
                &sql,
                rusqlite::params![
                    revision.model,
                    payload_param(&revision.document),
                    revision.operation.as_str(),
                    revision.document_id,
                    revision.revision,
                    revision.actor_id.as_ref().map(|a| a.as_str()),
                    chrono::Utc::now().timestamp(),
                ],
            )
            .map_err(|e| sink_error("save_revision", e))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn save_change(&mut self, change: &NewChangeRecord) -> Result<ChangeId> {
        let sql = format!(
            "INSERT INTO {} (path, document, diff, created_at) VALUES (?1, ?2, ?3, ?4)",
            self.change_table
        );
        self.conn
            .execute(
                &sql,
                rusqlite::params![
                    change.path,
                    payload_param(&change.document),
                    payload_param(&change.diff),
                    chrono::Utc::now().timestamp(),
                ],
            )
            .map_err(|e| sink_error("save_change", e))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn link_change(&mut self, revision_id: RevisionId, change_id: ChangeId) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET revision_id = ?1 WHERE id = ?2",
            self.change_table
        );
        let updated = self
            .conn
            .execute(&sql, rusqlite::params![revision_id, change_id])
            .map_err(|e| sink_error("link_change", e))?;

        if updated != 1 {
            return Err(TrailError::Persistence {
                op: "link_change".to_string(),
                message: format!("change record {} not found", change_id),
            });
        }
        Ok(())
    }
}
