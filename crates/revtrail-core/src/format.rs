//! Payload formats
//!
//! Document and diff payloads are stored either as native JSON or, for
//! backends without a JSON column type, as serialized text. The format is
//! chosen once from configuration; callers never branch on it.

use crate::errors::Result;
use crate::model::Payload;
use serde_json::Value;

/// Encoding strategy for stored payloads
pub trait PayloadFormat: Send + Sync {
    /// Encode a JSON value for storage
    ///
    /// # Errors
    ///
    /// `Serialization` if the value cannot be encoded.
    fn encode(&self, value: Value) -> Result<Payload>;

    /// SQL column type used for payload columns
    fn column_type(&self) -> &'static str;

    fn name(&self) -> &'static str;
}

/// Native JSON payloads
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredFormat;

impl PayloadFormat for StructuredFormat {
    fn encode(&self, value: Value) -> Result<Payload> {
        Ok(Payload::Structured(value))
    }

    fn column_type(&self) -> &'static str {
        "JSON"
    }

    fn name(&self) -> &'static str {
        "structured"
    }
}

/// JSON serialized to text
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFormat;

impl PayloadFormat for TextFormat {
    fn encode(&self, value: Value) -> Result<Payload> {
        Ok(Payload::Text(serde_json::to_string(&value)?))
    }

    fn column_type(&self) -> &'static str {
        "TEXT"
    }

    fn name(&self) -> &'static str {
        "text"
    }
}

/// Format for the configured storage mode
pub fn select_format(constrained_storage: bool) -> Box<dyn PayloadFormat> {
    if constrained_storage {
        Box::new(TextFormat)
    } else {
        Box::new(StructuredFormat)
    }
}
