//! Field filter
//!
//! Normalizes a raw attribute set before it is compared or stored. Nested
//! documents are not tracked: non-null composites are dropped silently.
//! Timestamps are scalar [`FieldValue::Timestamp`] values and survive.

use crate::model::{Attributes, FieldValue};

/// Remove composite values and excluded fields
///
/// Pure and idempotent.
pub fn filter(raw: &Attributes, exclude: &[String]) -> Attributes {
    raw.iter()
        .filter(|(_, value)| !is_untracked(value))
        .filter(|(name, _)| !exclude.iter().any(|x| x == *name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Keep only the named fields
///
/// Used for compression, where only the fields a mutation touched are
/// compared.
pub fn restrict(raw: &Attributes, fields: &[String]) -> Attributes {
    raw.iter()
        .filter(|(name, _)| fields.iter().any(|f| f == *name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn is_untracked(value: &FieldValue) -> bool {
    !value.is_null() && value.is_composite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EXCLUDES;
    use crate::model::attributes_from_json;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn excludes() -> Vec<String> {
        DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_drops_excluded_and_nested() {
        let mut raw = attributes_from_json(json!({
            "id": 7,
            "name": "Bob",
            "revision": 3,
            "tags": ["a", "b"],
            "profile": {"age": 4},
            "nickname": null,
            "updatedAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        let birthday = chrono::DateTime::parse_from_rfc3339("1990-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        raw.insert("birthday".to_string(), FieldValue::from(birthday));

        let filtered = filter(&raw, &excludes());
        let names: Vec<&str> = filtered.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["birthday", "name", "nickname"]);
        assert!(matches!(filtered["birthday"], FieldValue::Timestamp(_)));
        assert_eq!(filtered["nickname"], FieldValue::Null);
    }

    #[test]
    fn test_restrict_keeps_named_fields() {
        let raw = attributes_from_json(json!({"a": 1, "b": 2, "c": 3})).unwrap();
        let restricted = restrict(&raw, &["a".to_string(), "c".to_string(), "z".to_string()]);
        assert_eq!(restricted.len(), 2);
        assert!(restricted.contains_key("a"));
        assert!(!restricted.contains_key("b"));
    }

    fn scalar() -> impl Strategy<Value = FieldValue> {
        prop_oneof![
            Just(FieldValue::Null),
            any::<bool>().prop_map(FieldValue::Bool),
            any::<i64>().prop_map(FieldValue::Int),
            "[a-z]{0,6}".prop_map(FieldValue::Text),
        ]
    }

    fn value() -> impl Strategy<Value = FieldValue> {
        scalar().prop_recursive(2, 8, 3, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..3).prop_map(FieldValue::List),
                prop::collection::btree_map("[a-z]{1,3}", inner, 0..3).prop_map(FieldValue::Map),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_filter_is_idempotent(
            raw in prop::collection::btree_map("[a-z_]{1,8}", value(), 0..8)
        ) {
            let raw: BTreeMap<String, FieldValue> = raw;
            let once = filter(&raw, &excludes());
            let twice = filter(&once, &excludes());
            prop_assert_eq!(once.clone(), twice);
            prop_assert!(once.values().all(|v| !v.is_composite()));
        }
    }
}
