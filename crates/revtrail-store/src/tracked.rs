//! Tracked entity operations with boundary logging.
//!
//! [`Tracked`] binds the engine hooks around the row writes of one entity
//! type:
//! - Create, update and destroy inside a caller-owned transaction
//! - Point reads and revision history
//!
//! Entity rows live in `E::TABLE` as `id TEXT PRIMARY KEY`, `document TEXT`
//! (the serialized entity) and the revision counter column.
//!
//! ## Logging Ownership
//!
//! This module owns lifecycle logging for tracked operations:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! The engine and the sink use only `tracing::debug!()` for internal details.

#![allow(clippy::result_large_err)]

use crate::errors::{decode_error, from_rusqlite, invalid_identifier, not_found, Result};
use crate::repo::{RevisionRepo, StoredRevision, TxSink};
use crate::schema::ensure_revision_column;
use revtrail_core::config::is_identifier;
use revtrail_core::{
    attributes_from_json, log_op_end, log_op_error, log_op_start, ActorId, Attributes,
    FieldValue, Instance, Operation, PaperTrail, Pending, RevisionId,
};
use rusqlite::{Connection, OptionalExtension, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

/// An entity type whose mutations are revisioned
pub trait TrackedEntity: Serialize + DeserializeOwned {
    /// Model name recorded on revisions
    const MODEL: &'static str;
    /// Table holding the entity rows
    const TABLE: &'static str;

    fn document_id(&self) -> String;
}

/// Per-call options for a tracked mutation
#[derive(Debug, Clone, Default)]
pub struct MutationOptions {
    /// Actor recorded on the revision; the trail's resolver is asked otherwise
    pub actor: Option<ActorId>,
    /// Fields the mutation touches, compared alone under compression
    pub fields: Option<Vec<String>>,
}

impl MutationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actor(mut self, actor: impl Into<ActorId>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// An entity together with its revision counter
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<E> {
    pub entity: E,
    /// Counter stored on the row
    pub revision: i64,
    /// Revision written by this call, if one was due
    pub revision_id: Option<RevisionId>,
}

pub struct Tracked<E> {
    trail: Arc<PaperTrail>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: TrackedEntity> Tracked<E> {
    /// Bind `trail` to entity type `E`
    ///
    /// With `auto_schema` enabled the counter column is added to `E::TABLE`
    /// when missing.
    pub fn new(conn: &Connection, trail: Arc<PaperTrail>) -> Result<Self> {
        if !is_identifier(E::TABLE) {
            return Err(invalid_identifier("table", E::TABLE));
        }
        if trail.config().auto_schema {
            ensure_revision_column(conn, E::TABLE, &trail.config().revision_attribute)?;
        }
        Ok(Self {
            trail,
            _entity: PhantomData,
        })
    }

    /// Create `E::TABLE` with the counter column if it does not exist
    pub fn define_table(conn: &Connection, trail: &PaperTrail) -> Result<()> {
        if !is_identifier(E::TABLE) {
            return Err(invalid_identifier("table", E::TABLE));
        }
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id TEXT PRIMARY KEY,
                    document TEXT NOT NULL,
                    {} INTEGER NOT NULL DEFAULT 0
                )",
                E::TABLE,
                trail.config().revision_attribute
            ),
            [],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    pub fn trail(&self) -> &PaperTrail {
        &self.trail
    }

    /// Insert a new entity
    ///
    /// ## Errors
    ///
    /// - `Serialization`: the entity does not serialize to a JSON object
    /// - `MissingActor`: fail-hard mode without an actor
    /// - `Persistence`: database error, including a duplicate id
    pub fn create(
        &self,
        tx: &Transaction<'_>,
        entity: &E,
        options: &MutationOptions,
    ) -> Result<Versioned<E>> {
        let document_id = entity.document_id();
        log_op_start!("tracked_create", model = E::MODEL, document_id = %document_id);
        let start = Instant::now();

        let result = self.create_impl(tx, &document_id, entity, options).map_err(|e| {
            log_op_error!(
                "tracked_create",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "tracked_create",
            duration_ms = start.elapsed().as_millis() as u64,
            revision = result.revision
        );
        Ok(result)
    }

    fn create_impl(
        &self,
        tx: &Transaction<'_>,
        document_id: &str,
        entity: &E,
        options: &MutationOptions,
    ) -> Result<Versioned<E>> {
        let document = to_document(entity)?;
        let mut instance = self.instance(
            document_id,
            Attributes::new(),
            attributes_from_json(document.clone())?,
            options,
        );
        let pending = self.trail.before_mutation(Operation::Create, &mut instance)?;

        let revision = self.stamped_counter(&instance);
        let document = self.stamp_document(document, revision);
        tx.execute(
            &format!(
                "INSERT INTO {} (id, document, {}) VALUES (?1, ?2, ?3)",
                E::TABLE,
                self.attribute()
            ),
            rusqlite::params![document_id, document, revision],
        )
        .map_err(from_rusqlite)?;

        let revision_id = self.record(tx, &instance, pending, options)?;
        Ok(Versioned {
            entity: from_document(document)?,
            revision,
            revision_id,
        })
    }

    /// Replace an existing entity
    ///
    /// ## Errors
    ///
    /// - `NotFound`: no row with the entity's id
    /// - `MissingRevisionCounter`: fail-hard mode and the row has no counter
    /// - `Persistence`: database error
    pub fn update(
        &self,
        tx: &Transaction<'_>,
        entity: &E,
        options: &MutationOptions,
    ) -> Result<Versioned<E>> {
        let document_id = entity.document_id();
        log_op_start!("tracked_update", model = E::MODEL, document_id = %document_id);
        let start = Instant::now();

        let result = self.update_impl(tx, &document_id, entity, options).map_err(|e| {
            log_op_error!(
                "tracked_update",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "tracked_update",
            duration_ms = start.elapsed().as_millis() as u64,
            revision = result.revision
        );
        Ok(result)
    }

    fn update_impl(
        &self,
        tx: &Transaction<'_>,
        document_id: &str,
        entity: &E,
        options: &MutationOptions,
    ) -> Result<Versioned<E>> {
        let (stored, committed) = self
            .load(tx, document_id)?
            .ok_or_else(|| not_found(E::MODEL, document_id))?;

        let document = to_document(entity)?;
        let mut instance = self.instance(
            document_id,
            self.snapshot(stored, committed)?,
            attributes_from_json(document.clone())?,
            options,
        );
        let pending = self.trail.before_mutation(Operation::Update, &mut instance)?;

        let revision = self.stamped_counter(&instance);
        let document = self.stamp_document(document, revision);
        tx.execute(
            &format!(
                "UPDATE {} SET document = ?1, {} = ?2 WHERE id = ?3",
                E::TABLE,
                self.attribute()
            ),
            rusqlite::params![document, revision, document_id],
        )
        .map_err(from_rusqlite)?;

        let revision_id = self.record(tx, &instance, pending, options)?;
        Ok(Versioned {
            entity: from_document(document)?,
            revision,
            revision_id,
        })
    }

    /// Delete an entity, recording a final revision
    ///
    /// ## Errors
    ///
    /// - `NotFound`: no row with this id
    /// - `Persistence`: database error
    pub fn destroy(
        &self,
        tx: &Transaction<'_>,
        document_id: &str,
        options: &MutationOptions,
    ) -> Result<Versioned<E>> {
        log_op_start!("tracked_destroy", model = E::MODEL, document_id = %document_id);
        let start = Instant::now();

        let result = self.destroy_impl(tx, document_id, options).map_err(|e| {
            log_op_error!(
                "tracked_destroy",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "tracked_destroy",
            duration_ms = start.elapsed().as_millis() as u64,
            revision = result.revision
        );
        Ok(result)
    }

    fn destroy_impl(
        &self,
        tx: &Transaction<'_>,
        document_id: &str,
        options: &MutationOptions,
    ) -> Result<Versioned<E>> {
        let (stored, committed) = self
            .load(tx, document_id)?
            .ok_or_else(|| not_found(E::MODEL, document_id))?;

        let snapshot = self.snapshot(stored.clone(), committed)?;
        let mut instance = Instance::new(E::MODEL, document_id, snapshot.clone(), snapshot);
        let pending = self.trail.before_mutation(Operation::Destroy, &mut instance)?;

        let revision = self.stamped_counter(&instance);
        tx.execute(
            &format!("DELETE FROM {} WHERE id = ?1", E::TABLE),
            [document_id],
        )
        .map_err(from_rusqlite)?;

        let revision_id = self.record(tx, &instance, pending, options)?;
        Ok(Versioned {
            entity: from_document(self.stamp_document(stored, revision))?,
            revision,
            revision_id,
        })
    }

    /// Current row, if any
    pub fn get(&self, conn: &Connection, document_id: &str) -> Result<Option<Versioned<E>>> {
        self.load(conn, document_id)?
            .map(|(stored, committed)| {
                let revision = committed.unwrap_or(0);
                Ok(Versioned {
                    entity: from_document(self.stamp_document(stored, revision))?,
                    revision,
                    revision_id: None,
                })
            })
            .transpose()
    }

    /// Recorded revisions of one entity, oldest first
    pub fn history(&self, conn: &Connection, document_id: &str) -> Result<Vec<StoredRevision>> {
        RevisionRepo::new(conn, self.trail.config()).list_for_document(E::MODEL, document_id)
    }

    fn attribute(&self) -> &str {
        &self.trail.config().revision_attribute
    }

    fn instance(
        &self,
        document_id: &str,
        previous: Attributes,
        current: Attributes,
        options: &MutationOptions,
    ) -> Instance {
        let instance = Instance::new(E::MODEL, document_id, previous, current);
        match &options.fields {
            Some(fields) => instance.with_changed_fields(fields.iter().cloned()),
            None => instance,
        }
    }

    /// Committed attributes: the stored document plus the counter column
    fn snapshot(&self, stored: Value, committed: Option<i64>) -> Result<Attributes> {
        let mut attributes = attributes_from_json(stored)?;
        match committed {
            Some(counter) => attributes.insert(self.attribute().to_string(), FieldValue::Int(counter)),
            None => attributes.remove(self.attribute()),
        };
        Ok(attributes)
    }

    fn stamped_counter(&self, instance: &Instance) -> i64 {
        instance.counter(self.attribute()).unwrap_or(0)
    }

    /// Mirror the counter into the document when the entity carries it
    fn stamp_document(&self, mut document: Value, revision: i64) -> Value {
        if let Some(object) = document.as_object_mut() {
            if let Some(slot) = object.get_mut(self.attribute()) {
                *slot = Value::from(revision);
            }
        }
        document
    }

    fn load(&self, conn: &Connection, document_id: &str) -> Result<Option<(Value, Option<i64>)>> {
        let row: Option<(String, Option<i64>)> = conn
            .query_row(
                &format!(
                    "SELECT document, {} FROM {} WHERE id = ?1",
                    self.attribute(),
                    E::TABLE
                ),
                [document_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(from_rusqlite)?;

        row.map(|(document, counter)| {
            serde_json::from_str(&document)
                .map(|value| (value, counter))
                .map_err(|e| decode_error("entity_decode", e))
        })
        .transpose()
    }

    fn record(
        &self,
        tx: &Transaction<'_>,
        instance: &Instance,
        pending: Pending,
        options: &MutationOptions,
    ) -> Result<Option<RevisionId>> {
        let mut sink = TxSink::new(tx, self.trail.config());
        Ok(self
            .trail
            .after_mutation(instance, pending, options.actor.as_ref(), &mut sink)?)
    }
}

fn to_document<E: Serialize>(entity: &E) -> Result<Value> {
    serde_json::to_value(entity).map_err(|e| decode_error("entity_encode", e))
}

fn from_document<E: DeserializeOwned>(document: Value) -> Result<E> {
    serde_json::from_value(document).map_err(|e| decode_error("entity_decode", e))
}
