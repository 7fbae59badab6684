//! Revision sequencer
//!
//! Decides whether a mutation deserves a revision and stamps the entity's
//! counter. The in-flight counter is always reset to the committed value
//! first, so callers cannot forge or skip revision numbers.
//!
//! There is no compare-and-swap against the stored row: two transactions that
//! both read counter N will both stamp N + 1. Lost-update prevention relies
//! on the isolation level of the host transaction.

use crate::diff::Delta;
use crate::errors::{Result, TrailError};
use crate::model::{Instance, Operation};

/// Outcome of [`decide`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub should_revision: bool,
    pub next_counter: i64,
}

/// Destroys always revision; creates and updates only with a non-empty delta
pub fn decide(operation: Operation, delta: &Delta, current: Option<i64>) -> Decision {
    Decision {
        should_revision: operation.is_destroy() || !delta.is_empty(),
        next_counter: current.unwrap_or(0) + 1,
    }
}

/// State carried from the pre-mutation phase to the post-mutation phase
#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    operation: Operation,
    delta: Delta,
    revision: Option<i64>,
}

impl Pending {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn delta(&self) -> &Delta {
        &self.delta
    }

    /// Counter stamped on the entity, if a revision is due
    pub fn revision(&self) -> Option<i64> {
        self.revision
    }

    pub fn should_record(&self) -> bool {
        self.revision.is_some()
    }
}

/// Reset, check and advance the instance's counter
///
/// # Errors
///
/// `MissingRevisionCounter` when `fail_hard` is set and an update has no
/// committed counter.
pub fn stamp(
    instance: &mut Instance,
    operation: Operation,
    delta: Delta,
    counter_attribute: &str,
    fail_hard: bool,
) -> Result<Pending> {
    let committed = instance.previous_counter(counter_attribute);
    instance.set_counter(counter_attribute, committed);

    if fail_hard && committed.is_none() && operation == Operation::Update {
        return Err(TrailError::MissingRevisionCounter {
            model: instance.model().to_string(),
            document_id: instance.document_id().to_string(),
        });
    }

    let decision = decide(operation, &delta, committed);
    if !decision.should_revision {
        return Ok(Pending {
            operation,
            delta,
            revision: None,
        });
    }

    instance.set_counter(counter_attribute, Some(decision.next_counter));
    Ok(Pending {
        operation,
        delta,
        revision: Some(decision.next_counter),
    })
}
