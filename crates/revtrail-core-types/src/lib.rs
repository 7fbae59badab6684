//! Core types shared across RevTrail facilities
//!
//! This crate provides foundational types used by the engine, the store
//! and the logging facility:
//!
//! - **Actor identity**: ActorId, the acting user recorded on each revision
//! - **Schema constants**: Canonical field keys and event names

pub mod actor;
pub mod schema;

pub use actor::ActorId;
