//! Delta types.
//!
//! Entries serialize with the short keys `kind`, `path`, `lhs`, `rhs`,
//! `index` and `item`, so a stored change record document is the entry itself.

use crate::model::FieldValue;
use serde::{Deserialize, Serialize};

/// One step into a snapshot: a field name or an array index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{}", i),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Key(value.to_string())
    }
}

/// Edit kind of a delta entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Present only in the new snapshot
    #[serde(rename = "N")]
    Added,
    /// Present only in the old snapshot
    #[serde(rename = "D")]
    Deleted,
    /// Present in both with different values
    #[serde(rename = "E")]
    Edited,
    /// An array element changed; see `index` and `item`
    #[serde(rename = "A")]
    Array,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaEntry {
    pub kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lhs: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rhs: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Box<DeltaEntry>>,
}

impl DeltaEntry {
    pub fn added(path: Vec<PathSegment>, rhs: FieldValue) -> Self {
        Self::leaf(ChangeKind::Added, path, None, Some(rhs))
    }

    pub fn deleted(path: Vec<PathSegment>, lhs: FieldValue) -> Self {
        Self::leaf(ChangeKind::Deleted, path, Some(lhs), None)
    }

    pub fn edited(path: Vec<PathSegment>, lhs: FieldValue, rhs: FieldValue) -> Self {
        Self::leaf(ChangeKind::Edited, path, Some(lhs), Some(rhs))
    }

    pub fn array(path: Vec<PathSegment>, index: usize, item: DeltaEntry) -> Self {
        Self {
            kind: ChangeKind::Array,
            path,
            lhs: None,
            rhs: None,
            index: Some(index),
            item: Some(Box::new(item)),
        }
    }

    fn leaf(
        kind: ChangeKind,
        path: Vec<PathSegment>,
        lhs: Option<FieldValue>,
        rhs: Option<FieldValue>,
    ) -> Self {
        Self {
            kind,
            path,
            lhs,
            rhs,
            index: None,
            item: None,
        }
    }

    /// Old and new values; array entries answer with their nested item's
    pub fn values(&self) -> (Option<&FieldValue>, Option<&FieldValue>) {
        match &self.item {
            Some(item) => (item.lhs.as_ref(), item.rhs.as_ref()),
            None => (self.lhs.as_ref(), self.rhs.as_ref()),
        }
    }

    /// The top-level field this entry belongs to
    pub fn field(&self) -> Option<String> {
        self.path.first().map(ToString::to_string)
    }

    /// Whether any path segment names one of `fields`
    pub fn mentions_any(&self, fields: &[String]) -> bool {
        self.path.iter().any(|seg| match seg {
            PathSegment::Key(k) => fields.iter().any(|f| f == k),
            PathSegment::Index(_) => false,
        })
    }
}

/// Ordered list of changes between two snapshots
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta(Vec<DeltaEntry>);

impl Delta {
    pub fn new(entries: Vec<DeltaEntry>) -> Self {
        Self(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn entries(&self) -> &[DeltaEntry] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeltaEntry> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Delta {
    type Item = &'a DeltaEntry;
    type IntoIter = std::slice::Iter<'a, DeltaEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
