//! Revision history queries
//!
//! Reads back what [`super::TxSink`] wrote. Payload columns are decoded to
//! JSON whichever format stored them.

#![allow(clippy::result_large_err)]

use crate::errors::{decode_error, from_rusqlite, Result};
use revtrail_core::errors::{ExError, ExErrorKind};
use revtrail_core::{ActorId, ChangeId, Operation, RevisionId, TrailConfig};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::Value;

/// A persisted revision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRevision {
    pub id: RevisionId,
    pub model: String,
    pub document_id: String,
    pub revision: i64,
    pub operation: Operation,
    pub document: Value,
    pub actor_id: Option<ActorId>,
    pub created_at: i64,
}

/// A persisted change record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredChange {
    pub id: ChangeId,
    pub path: String,
    pub document: Value,
    pub diff: Value,
    pub revision_id: Option<RevisionId>,
    pub created_at: i64,
}

/// Raw revision columns, before decoding
struct RevisionRow {
    id: RevisionId,
    model: String,
    document_id: String,
    revision: i64,
    operation: String,
    document: String,
    actor_id: Option<String>,
    created_at: i64,
}

impl RevisionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            model: row.get(1)?,
            document_id: row.get(2)?,
            revision: row.get(3)?,
            operation: row.get(4)?,
            document: row.get(5)?,
            actor_id: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn decode(self) -> Result<StoredRevision> {
        let operation: Operation = self.operation.parse().map_err(|reason: String| {
            ExError::new(ExErrorKind::Serialization)
                .with_op("revision_decode")
                .with_revision(self.revision)
                .with_message(reason)
        })?;
        Ok(StoredRevision {
            id: self.id,
            model: self.model,
            document_id: self.document_id,
            revision: self.revision,
            operation,
            document: serde_json::from_str(&self.document)
                .map_err(|e| decode_error("revision_decode", e))?,
            actor_id: self.actor_id.map(ActorId::new),
            created_at: self.created_at,
        })
    }
}

const REVISION_COLUMNS: &str =
    "id, model, document_id, revision, operation, document, actor_id, created_at";

/// Read-only access to the audit tables
pub struct RevisionRepo<'a> {
    conn: &'a Connection,
    revision_table: &'a str,
    change_table: &'a str,
}

impl<'a> RevisionRepo<'a> {
    pub fn new(conn: &'a Connection, config: &'a TrailConfig) -> Self {
        Self {
            conn,
            revision_table: &config.revision_table,
            change_table: &config.revision_change_table,
        }
    }

    /// All revisions of one document, oldest first
    pub fn list_for_document(&self, model: &str, document_id: &str) -> Result<Vec<StoredRevision>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE model = ?1 AND document_id = ?2 ORDER BY revision, id",
            REVISION_COLUMNS, self.revision_table
        );
        let mut stmt = self.conn.prepare(&sql).map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([model, document_id], RevisionRow::from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        rows.into_iter().map(RevisionRow::decode).collect()
    }

    /// One revision by document and number
    pub fn get(&self, model: &str, document_id: &str, revision: i64) -> Result<Option<StoredRevision>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE model = ?1 AND document_id = ?2 AND revision = ?3
             ORDER BY id DESC LIMIT 1",
            REVISION_COLUMNS, self.revision_table
        );
        self.conn
            .query_row(
                &sql,
                rusqlite::params![model, document_id, revision],
                RevisionRow::from_row,
            )
            .optional()
            .map_err(from_rusqlite)?
            .map(RevisionRow::decode)
            .transpose()
    }

    /// Change records linked to a revision, in insertion order
    pub fn changes_for(&self, revision_id: RevisionId) -> Result<Vec<StoredChange>> {
        let sql = format!(
            "SELECT id, path, document, diff, revision_id, created_at FROM {}
             WHERE revision_id = ?1 ORDER BY id",
            self.change_table
        );
        let mut stmt = self.conn.prepare(&sql).map_err(from_rusqlite)?;
        let rows: Vec<(ChangeId, String, String, String, Option<RevisionId>, i64)> = stmt
            .query_map([revision_id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        rows.into_iter()
            .map(|(id, path, document, diff, revision_id, created_at)| {
                Ok(StoredChange {
                    id,
                    path,
                    document: serde_json::from_str(&document)
                        .map_err(|e| decode_error("change_decode", e))?,
                    diff: serde_json::from_str(&diff)
                        .map_err(|e| decode_error("change_decode", e))?,
                    revision_id,
                    created_at,
                })
            })
            .collect()
    }

    /// Number of revisions recorded for a model
    pub fn count(&self, model: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE model = ?1", self.revision_table);
        self.conn
            .query_row(&sql, [model], |row| row.get(0))
            .map_err(from_rusqlite)
    }
}
