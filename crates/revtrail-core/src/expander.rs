//! Change record expansion
//!
//! When change records are enabled, every delta entry becomes one record
//! holding the entry itself and a character diff between the textual forms of
//! its old and new values.

use crate::diff::{diff_chars, Delta, DeltaEntry};
use crate::errors::{Result, TrailError};
use crate::format::PayloadFormat;
use crate::model::{FieldValue, NewChangeRecord};

/// Strategy producing per-field change records from a delta
pub trait ChangeExpander: Send + Sync {
    /// # Errors
    ///
    /// `Serialization` when a value cannot be rendered or encoded.
    fn expand(&self, delta: &Delta, format: &dyn PayloadFormat) -> Result<Vec<NewChangeRecord>>;

    fn is_enabled(&self) -> bool;
}

/// Expander used when change records are disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExpander;

impl ChangeExpander for NoopExpander {
    fn expand(&self, _delta: &Delta, _format: &dyn PayloadFormat) -> Result<Vec<NewChangeRecord>> {
        Ok(Vec::new())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// One record per delta entry with a character-level diff
#[derive(Debug, Default, Clone, Copy)]
pub struct CharDiffExpander;

impl ChangeExpander for CharDiffExpander {
    fn expand(&self, delta: &Delta, format: &dyn PayloadFormat) -> Result<Vec<NewChangeRecord>> {
        delta
            .iter()
            .map(|entry| expand_entry(entry, format))
            .collect()
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

fn expand_entry(entry: &DeltaEntry, format: &dyn PayloadFormat) -> Result<NewChangeRecord> {
    let (lhs, rhs) = entry.values();
    let old = render_text(lhs)?;
    let new = render_text(rhs)?;

    let spans = if old.is_empty() && new.is_empty() {
        Vec::new()
    } else {
        diff_chars(&old, &new)
    };

    Ok(NewChangeRecord {
        path: entry.field().unwrap_or_default(),
        document: format.encode(serde_json::to_value(entry)?)?,
        diff: format.encode(serde_json::to_value(&spans)?)?,
    })
}

/// Textual form of a value for character diffing
///
/// Absent and null render empty, booleans as `1`/`0`, timestamps as RFC 3339
/// and composites as compact JSON.
///
/// # Errors
///
/// `Serialization` for non-finite floats.
pub fn render_text(value: Option<&FieldValue>) -> Result<String> {
    let Some(value) = value else {
        return Ok(String::new());
    };
    Ok(match value {
        FieldValue::Null => String::new(),
        FieldValue::Bool(true) => "1".to_string(),
        FieldValue::Bool(false) => "0".to_string(),
        FieldValue::Int(n) => n.to_string(),
        FieldValue::Float(f) if f.is_finite() => f.to_string(),
        FieldValue::Float(f) => {
            return Err(TrailError::Serialization {
                message: format!("cannot render float {} as text", f),
            })
        }
        FieldValue::Timestamp(t) => t.to_rfc3339(),
        FieldValue::Text(s) => s.clone(),
        FieldValue::List(_) | FieldValue::Map(_) => value.to_json()?.to_string(),
    })
}
