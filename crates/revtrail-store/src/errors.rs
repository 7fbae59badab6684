//! Error handling for revtrail-store
//!
//! Wraps revtrail-core ExError with store-specific helpers

use revtrail_core::errors::{ExError, ExErrorKind, TrailError};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::InvariantViolation)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a missing entity error
pub fn not_found(model: &str, document_id: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_model(model)
        .with_document_id(document_id)
        .with_message(format!("{} {} does not exist", model, document_id))
}

/// Create a missing table error
pub fn missing_table(table: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("schema")
        .with_message(format!("table {} does not exist", table))
}

/// Create an invalid identifier error
pub fn invalid_identifier(what: &str, value: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("schema")
        .with_message(format!("{} is not a plain SQL identifier: {:?}", what, value))
}

/// Create a stored payload decoding error
pub fn decode_error(op: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(op.to_string())
        .with_message(err.to_string())
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Engine-side persistence failure from rusqlite::Error
///
/// Sinks report through the engine's error type so the orchestrator can
/// propagate them unchanged.
pub fn sink_error(op: &str, err: rusqlite::Error) -> TrailError {
    TrailError::Persistence {
        op: op.to_string(),
        message: err.to_string(),
    }
}
