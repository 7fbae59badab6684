//! Snapshot change detector.
//!
//! The core entry point is [`detect`], which walks two attribute snapshots
//! and produces a [`Delta`] of additions, deletions, edits and array element
//! changes.

use crate::diff::delta::{ChangeKind, Delta, DeltaEntry, PathSegment};
use crate::model::{Attributes, FieldValue};
use chrono::DateTime;
use std::collections::{BTreeMap, BTreeSet};

/// Compute the delta from `previous` to `current`
///
/// Under `strict`, any structural or type difference is an edit. Otherwise
/// edits between loosely equal values (see [`loose_eq`]) are suppressed.
/// Entries whose path names an excluded field are dropped in both modes.
pub fn detect(
    previous: &Attributes,
    current: &Attributes,
    exclude: &[String],
    strict: bool,
) -> Delta {
    let mut entries = Vec::new();
    diff_maps(previous, current, &mut Vec::new(), &mut entries);

    entries.retain(|entry| {
        if strict || entry.kind != ChangeKind::Edited {
            return true;
        }
        match (&entry.lhs, &entry.rhs) {
            (Some(lhs), Some(rhs)) => !loose_eq(lhs, rhs),
            _ => true,
        }
    });
    entries.retain(|entry| !entry.mentions_any(exclude));

    Delta::new(entries)
}

fn diff_maps(
    lhs: &BTreeMap<String, FieldValue>,
    rhs: &BTreeMap<String, FieldValue>,
    path: &mut Vec<PathSegment>,
    out: &mut Vec<DeltaEntry>,
) {
    let keys: BTreeSet<&String> = lhs.keys().chain(rhs.keys()).collect();
    for key in keys {
        path.push(PathSegment::Key(key.clone()));
        match (lhs.get(key), rhs.get(key)) {
            (Some(a), Some(b)) => diff_values(a, b, path, out),
            (Some(a), None) => out.push(DeltaEntry::deleted(path.clone(), a.clone())),
            (None, Some(b)) => out.push(DeltaEntry::added(path.clone(), b.clone())),
            (None, None) => {}
        }
        path.pop();
    }
}

fn diff_values(
    lhs: &FieldValue,
    rhs: &FieldValue,
    path: &mut Vec<PathSegment>,
    out: &mut Vec<DeltaEntry>,
) {
    match (lhs, rhs) {
        (FieldValue::Map(a), FieldValue::Map(b)) => diff_maps(a, b, path, out),
        (FieldValue::List(a), FieldValue::List(b)) => diff_lists(a, b, path, out),
        _ if lhs == rhs => {}
        _ => out.push(DeltaEntry::edited(path.clone(), lhs.clone(), rhs.clone())),
    }
}

fn diff_lists(
    lhs: &[FieldValue],
    rhs: &[FieldValue],
    path: &mut Vec<PathSegment>,
    out: &mut Vec<DeltaEntry>,
) {
    let common = lhs.len().min(rhs.len());
    for i in 0..common {
        path.push(PathSegment::Index(i));
        diff_values(&lhs[i], &rhs[i], path, out);
        path.pop();
    }
    for (i, removed) in lhs.iter().enumerate().skip(common) {
        let item = DeltaEntry::deleted(Vec::new(), removed.clone());
        out.push(DeltaEntry::array(path.clone(), i, item));
    }
    for (i, added) in rhs.iter().enumerate().skip(common) {
        let item = DeltaEntry::added(Vec::new(), added.clone());
        out.push(DeltaEntry::array(path.clone(), i, item));
    }
}

/// Loose equality in the spirit of JavaScript `==`
///
/// Numbers, booleans and numeric text compare by numeric value (empty text is
/// zero). Text compares to text exactly. Timestamps match text that parses to
/// the same instant and integers equal to their epoch milliseconds. Null only
/// equals null.
pub fn loose_eq(lhs: &FieldValue, rhs: &FieldValue) -> bool {
    use FieldValue::*;
    match (lhs, rhs) {
        (Null, Null) => true,
        (Null, _) | (_, Null) => false,
        (Text(a), Text(b)) => a == b,
        (Timestamp(a), Timestamp(b)) => a == b,
        (Timestamp(t), other) | (other, Timestamp(t)) => match other {
            Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|parsed| parsed == *t)
                .unwrap_or(false),
            Int(ms) => t.timestamp_millis() == *ms,
            Float(ms) => t.timestamp_millis() as f64 == *ms,
            _ => false,
        },
        (List(_), _) | (_, List(_)) | (Map(_), _) | (_, Map(_)) => lhs == rhs,
        _ => match (as_number(lhs), as_number(rhs)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn as_number(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        FieldValue::Int(n) => Some(*n as f64),
        FieldValue::Float(f) => Some(*f),
        FieldValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse().ok()
            }
        }
        _ => None,
    }
}
