//! Engine configuration
//!
//! Resolved once when a [`crate::PaperTrail`] is constructed. Every field has
//! a default, so an empty TOML document is a valid configuration.

use crate::errors::{Result, TrailError};
use serde::{Deserialize, Serialize};

/// Fields never compared or stored unless the caller overrides `exclude`
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "id",
    "createdAt",
    "updatedAt",
    "deletedAt",
    "created_at",
    "updated_at",
    "deleted_at",
    "revision",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// Fields never compared or stored
    pub exclude: Vec<String>,
    /// Attribute (and column) holding the revision counter
    pub revision_attribute: String,
    /// Table receiving revision records
    pub revision_table: String,
    /// Table receiving per-field change records
    pub revision_change_table: String,
    /// Record one change row per changed field path
    pub enable_revision_changes: bool,
    /// Strict (type-aware) comparison; lenient coerces like `==`
    pub strict_diff: bool,
    /// Store document and diff payloads as serialized text
    pub constrained_storage: bool,
    /// Compare only the fields named by the mutation
    pub enable_compression: bool,
    /// Let the schema collaborator add a missing counter column
    pub auto_schema: bool,
    /// Missing counters on update and missing actors become errors
    pub fail_hard: bool,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            revision_attribute: "revision".to_string(),
            revision_table: "revisions".to_string(),
            revision_change_table: "revision_changes".to_string(),
            enable_revision_changes: false,
            strict_diff: true,
            constrained_storage: false,
            enable_compression: false,
            auto_schema: false,
            fail_hard: false,
        }
    }
}

impl TrailConfig {
    /// Parse and validate a TOML configuration
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for malformed TOML or invalid identifiers.
    ///
    /// # Example
    ///
    /// ```
    /// use revtrail_core::TrailConfig;
    ///
    /// let config = TrailConfig::from_toml_str(r#"
    ///     enable_revision_changes = true
    ///     strict_diff = false
    /// "#).unwrap();
    /// assert!(config.enable_revision_changes);
    /// assert_eq!(config.revision_attribute, "revision");
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: TrailConfig = toml::from_str(input).map_err(|e| TrailError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check identifiers that end up in SQL statements
    ///
    /// # Errors
    ///
    /// `InvalidConfig` naming the first offending option.
    pub fn validate(&self) -> Result<()> {
        for (option, value) in [
            ("revision_attribute", &self.revision_attribute),
            ("revision_table", &self.revision_table),
            ("revision_change_table", &self.revision_change_table),
        ] {
            if !is_identifier(value) {
                return Err(TrailError::InvalidConfig {
                    reason: format!("{} must be a plain SQL identifier, got {:?}", option, value),
                });
            }
        }
        if self.revision_table == self.revision_change_table {
            return Err(TrailError::InvalidConfig {
                reason: "revision_table and revision_change_table must differ".to_string(),
            });
        }
        Ok(())
    }

    /// `exclude` plus the revision attribute, which is never compared or stored
    pub fn excluded_fields(&self) -> Vec<String> {
        let mut fields = self.exclude.clone();
        if !fields.contains(&self.revision_attribute) {
            fields.push(self.revision_attribute.clone());
        }
        fields
    }

    pub fn is_excluded(&self, field: &str) -> bool {
        field == self.revision_attribute || self.exclude.iter().any(|f| f == field)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
