//! Data model for tracked entities and the audit records derived from them

pub mod instance;
pub mod operation;
pub mod revision;
pub mod value;

pub use instance::{attributes_from_json, attributes_to_json, Attributes, Instance};
pub use operation::Operation;
pub use revision::{ChangeId, NewChangeRecord, NewRevision, Payload, RevisionId};
pub use value::FieldValue;
