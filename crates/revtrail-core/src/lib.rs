//! RevTrail Core - revision tracking engine
//!
//! This crate holds the storage-agnostic half of RevTrail:
//! - Attribute snapshots and the field filter that normalizes them
//! - Change detection (strict and lenient) producing a structured delta
//! - Revision sequencing: counter stamping and the decision to record
//! - Revision building with deployment-selected payload formats
//! - Optional per-field change records with character-level diffs
//! - Persistence orchestration against any [`RevisionSink`]
//!
//! Hosts drive it through [`PaperTrail::before_mutation`] and
//! [`PaperTrail::after_mutation`]; `revtrail-store` provides the SQLite binding.

pub mod actor;
pub mod builder;
pub mod config;
pub mod diff;
pub mod errors;
pub mod expander;
pub mod filter;
pub mod format;
pub mod logging_facility;
pub mod memory;
pub mod model;
pub mod persist;
pub mod sequencer;
pub mod trail;

// Re-export commonly used types
pub use actor::{ActorResolver, NoActor};
pub use builder::RevisionBuilder;
pub use config::TrailConfig;
pub use diff::{ChangeKind, Delta, DeltaEntry, DiffSpan, SpanOp};
pub use errors::{ExError, ExErrorKind, Result, TrailError};
pub use expander::{ChangeExpander, CharDiffExpander, NoopExpander};
pub use format::{PayloadFormat, StructuredFormat, TextFormat};
pub use memory::MemorySink;
pub use model::{
    attributes_from_json, attributes_to_json, Attributes, ChangeId, FieldValue, Instance, NewChangeRecord, NewRevision, Operation,
    Payload, RevisionId,
};
pub use persist::{persist, RevisionSink};
pub use sequencer::Pending;
pub use trail::{PaperTrail, PaperTrailBuilder};
pub use revtrail_core_types::ActorId;

#[doc(hidden)]
pub use revtrail_core_types::schema as __log_schema;
#[doc(hidden)]
pub use tracing as __tracing;
