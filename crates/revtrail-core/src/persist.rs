//! Persistence orchestration
//!
//! Saves a revision, then each of its change records, linking every record
//! to the revision id as it goes. The sink is bound to the caller's
//! transaction; nothing here commits or rolls back.

use crate::errors::Result;
use crate::model::{ChangeId, NewChangeRecord, NewRevision, RevisionId};

/// Write side of the audit store
///
/// Implementations write inside a transaction they do not own.
pub trait RevisionSink {
    /// # Errors
    ///
    /// `Persistence` if the row cannot be written.
    fn save_revision(&mut self, revision: &NewRevision) -> Result<RevisionId>;

    /// # Errors
    ///
    /// `Persistence` if the row cannot be written.
    fn save_change(&mut self, change: &NewChangeRecord) -> Result<ChangeId>;

    /// Associate a saved change record with its revision
    ///
    /// # Errors
    ///
    /// `Persistence` if the association cannot be written.
    fn link_change(&mut self, revision_id: RevisionId, change_id: ChangeId) -> Result<()>;
}

/// Save `revision` and its `changes` in order
///
/// Stops at the first failure. Rows already written stay in the caller's
/// transaction, which is expected to roll back.
///
/// # Errors
///
/// Whatever the sink reports.
pub fn persist<S>(sink: &mut S, revision: &NewRevision, changes: &[NewChangeRecord]) -> Result<RevisionId>
where
    S: RevisionSink + ?Sized,
{
    let revision_id = sink.save_revision(revision)?;
    tracing::debug!(
        model = %revision.model,
        document_id = %revision.document_id,
        revision = revision.revision,
        revision_id,
        "revision saved"
    );

    for change in changes {
        let change_id = sink.save_change(change)?;
        sink.link_change(revision_id, change_id)?;
        tracing::debug!(revision_id, change_id, path = %change.path, "change record linked");
    }

    Ok(revision_id)
}
