//! Repository layer
//!
//! Write access for the engine through [`TxSink`] and read access to stored
//! history through [`RevisionRepo`].

mod revision_repo;
mod sink;

pub use revision_repo::{RevisionRepo, StoredChange, StoredRevision};
pub use sink::TxSink;
