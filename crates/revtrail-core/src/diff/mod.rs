//! Change detection.
//!
//! Two independent diffs live here:
//!
//! - [`detect::detect`] compares two filtered attribute snapshots and produces
//!   a [`Delta`], the input to sequencing and change-record expansion.
//! - [`chars::diff_chars`] compares two rendered values character by
//!   character for human review.
//!
//! ## Guarantees
//!
//! - **Determinism**: keys are visited in sorted order, so the same two
//!   snapshots always produce the same delta.
//! - **Lenient noise suppression**: with strict mode off, edits between values
//!   that are loosely equal (`3` vs `"3"`) are dropped. Additions and removals
//!   are always reported.

pub mod chars;
pub mod delta;
pub mod detect;

pub use chars::{diff_chars, DiffSpan, SpanOp};
pub use delta::{ChangeKind, Delta, DeltaEntry, PathSegment};
pub use detect::{detect, loose_eq};
