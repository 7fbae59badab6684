//! Migration framework
//!
//! Provides:
//! - Migration runner with checksums and idempotent application
//! - Audit table migrations generated from the engine configuration

mod audit_schema;
mod checksums;
mod runner;

pub use audit_schema::{audit_migrations, define_models, Migration};
pub use checksums::compute_checksum;
pub use runner::apply_migrations;
