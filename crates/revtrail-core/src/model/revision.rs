//! Audit records produced by the engine, before they are persisted

use crate::model::Operation;
use revtrail_core_types::ActorId;
use serde_json::Value;

/// Identifier assigned to a revision by the sink
pub type RevisionId = i64;

/// Identifier assigned to a change record by the sink
pub type ChangeId = i64;

/// Document or diff payload in its storage encoding
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Native structured JSON value
    Structured(Value),
    /// JSON serialized to text, for constrained storage backends
    Text(String),
}

impl Payload {
    /// Text to write into a storage column
    pub fn to_column_text(&self) -> String {
        match self {
            Payload::Structured(value) => value.to_string(),
            Payload::Text(text) => text.clone(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Payload::Text(_))
    }
}

/// A revision ready to be saved
#[derive(Debug, Clone, PartialEq)]
pub struct NewRevision {
    pub model: String,
    pub document_id: String,
    pub revision: i64,
    pub operation: Operation,
    pub document: Payload,
    pub actor_id: Option<ActorId>,
}

/// A per-field change record ready to be saved and linked to its revision
#[derive(Debug, Clone, PartialEq)]
pub struct NewChangeRecord {
    /// First segment of the delta entry path
    pub path: String,
    /// The raw delta entry
    pub document: Payload,
    /// Character diff spans between old and new rendered values
    pub diff: Payload,
}
