//! RevTrail Store - SQLite binding for the revision engine
//!
//! Provides:
//! - Connection helpers and the audit table migrations
//! - A revision sink bound to the caller's transaction
//! - Revision history queries
//! - The schema collaborator for the revision counter column
//! - `Tracked<E>`, which wires the engine hooks around entity writes

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod schema;
pub mod tracked;

// Re-export key types
pub use errors::Result;
pub use migrations::define_models;
pub use repo::{RevisionRepo, StoredChange, StoredRevision, TxSink};
pub use tracked::{MutationOptions, Tracked, TrackedEntity, Versioned};
