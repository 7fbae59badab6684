//! Mutation-time view of a tracked entity
//!
//! An [`Instance`] carries the previously committed attributes and the
//! attributes about to be written. The revision counter lives among the
//! attributes under the configured name; only the sequencer may write it.

use crate::errors::{Result, TrailError};
use crate::model::FieldValue;
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute snapshot keyed by field name
pub type Attributes = BTreeMap<String, FieldValue>;

/// Build attributes from a JSON object
///
/// # Errors
///
/// `Serialization` if the value is not a JSON object.
pub fn attributes_from_json(value: Value) -> Result<Attributes> {
    match value {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, FieldValue::from(v)))
            .collect()),
        other => Err(TrailError::Serialization {
            message: format!("expected a JSON object for attributes, got {}", other),
        }),
    }
}

/// Render attributes as a JSON object
///
/// # Errors
///
/// `Serialization` if any value has no JSON representation.
pub fn attributes_to_json(attributes: &Attributes) -> Result<Value> {
    let mut out = serde_json::Map::new();
    for (k, v) in attributes {
        out.insert(k.clone(), v.to_json()?);
    }
    Ok(Value::Object(out))
}

/// One entity undergoing one mutation
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    model: String,
    document_id: String,
    previous: Attributes,
    current: Attributes,
    changed_fields: Option<Vec<String>>,
}

impl Instance {
    /// Create an instance from its committed and in-flight attributes
    ///
    /// For a create, `previous` is empty. For a destroy, `current` is usually
    /// the same as `previous`.
    pub fn new(
        model: impl Into<String>,
        document_id: impl Into<String>,
        previous: Attributes,
        current: Attributes,
    ) -> Self {
        Self {
            model: model.into(),
            document_id: document_id.into(),
            previous,
            current,
            changed_fields: None,
        }
    }

    /// Restrict comparison to the fields the caller named in the mutation
    ///
    /// Only honoured when compression is enabled in the configuration.
    pub fn with_changed_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.changed_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn previous(&self) -> &Attributes {
        &self.previous
    }

    pub fn current(&self) -> &Attributes {
        &self.current
    }

    pub fn changed_fields(&self) -> Option<&[String]> {
        self.changed_fields.as_deref()
    }

    /// Counter currently carried by the in-flight attributes
    pub fn counter(&self, attribute: &str) -> Option<i64> {
        self.current.get(attribute).and_then(FieldValue::as_i64)
    }

    /// Counter of the last committed state
    pub fn previous_counter(&self, attribute: &str) -> Option<i64> {
        self.previous.get(attribute).and_then(FieldValue::as_i64)
    }

    /// Overwrite the in-flight counter. Reserved for the sequencer.
    pub(crate) fn set_counter(&mut self, attribute: &str, counter: Option<i64>) {
        match counter {
            Some(n) => {
                self.current
                    .insert(attribute.to_string(), FieldValue::Int(n));
            }
            None => {
                self.current.remove(attribute);
            }
        }
    }
}
