//! In-memory revision sink
//!
//! Keeps saved rows in vectors. Useful for hosts without a database and for
//! exercising the engine in tests.

use crate::errors::{Result, TrailError};
use crate::model::{ChangeId, NewChangeRecord, NewRevision, RevisionId};
use crate::persist::RevisionSink;

#[derive(Debug, Default)]
pub struct MemorySink {
    revisions: Vec<(RevisionId, NewRevision)>,
    changes: Vec<(ChangeId, NewChangeRecord)>,
    links: Vec<(RevisionId, ChangeId)>,
    fail_on_path: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any change record whose path equals `path`
    pub fn fail_on_path(mut self, path: impl Into<String>) -> Self {
        self.fail_on_path = Some(path.into());
        self
    }

    pub fn revisions(&self) -> &[(RevisionId, NewRevision)] {
        &self.revisions
    }

    pub fn changes(&self) -> &[(ChangeId, NewChangeRecord)] {
        &self.changes
    }

    pub fn links(&self) -> &[(RevisionId, ChangeId)] {
        &self.links
    }

    /// Revisions recorded for one document, in save order
    pub fn history(&self, model: &str, document_id: &str) -> Vec<&NewRevision> {
        self.revisions
            .iter()
            .map(|(_, r)| r)
            .filter(|r| r.model == model && r.document_id == document_id)
            .collect()
    }

    /// Drop everything recorded so far, as a rollback would
    pub fn clear(&mut self) {
        self.revisions.clear();
        self.changes.clear();
        self.links.clear();
    }
}

impl RevisionSink for MemorySink {
    fn save_revision(&mut self, revision: &NewRevision) -> Result<RevisionId> {
        let id = self.revisions.len() as RevisionId + 1;
        self.revisions.push((id, revision.clone()));
        Ok(id)
    }

    fn save_change(&mut self, change: &NewChangeRecord) -> Result<ChangeId> {
        if self.fail_on_path.as_deref() == Some(change.path.as_str()) {
            return Err(TrailError::Persistence {
                op: "save_change".to_string(),
                message: format!("change record for '{}' rejected", change.path),
            });
        }
        let id = self.changes.len() as ChangeId + 1;
        self.changes.push((id, change.clone()));
        Ok(id)
    }

    fn link_change(&mut self, revision_id: RevisionId, change_id: ChangeId) -> Result<()> {
        if !self.revisions.iter().any(|(id, _)| *id == revision_id) {
            return Err(TrailError::Persistence {
                op: "link_change".to_string(),
                message: format!("unknown revision id {}", revision_id),
            });
        }
        self.links.push((revision_id, change_id));
        Ok(())
    }
}
