//! Engine facade
//!
//! [`PaperTrail`] resolves configuration into strategies once and exposes the
//! two mutation hooks. A host calls [`PaperTrail::before_mutation`] before
//! writing the entity row and [`PaperTrail::after_mutation`] after it, both
//! inside the same transaction.
//!
//! # Example
//!
//! ```
//! use revtrail_core::{
//!     attributes_from_json, Instance, MemorySink, Operation, PaperTrail, TrailConfig,
//! };
//! use serde_json::json;
//!
//! let trail = PaperTrail::new(TrailConfig::default()).unwrap();
//! let mut sink = MemorySink::new();
//!
//! let mut user = Instance::new(
//!     "User",
//!     "1",
//!     attributes_from_json(json!({"name": "Bob", "revision": 3})).unwrap(),
//!     attributes_from_json(json!({"name": "Bill", "revision": 3})).unwrap(),
//! );
//! let pending = trail.before_mutation(Operation::Update, &mut user).unwrap();
//! let id = trail.after_mutation(&user, pending, None, &mut sink).unwrap();
//!
//! assert!(id.is_some());
//! assert_eq!(user.counter("revision"), Some(4));
//! ```

use crate::actor::{ActorResolver, NoActor};
use crate::builder::RevisionBuilder;
use crate::config::TrailConfig;
use crate::diff::detect;
use crate::errors::Result;
use crate::expander::{ChangeExpander, CharDiffExpander, NoopExpander};
use crate::filter::{filter, restrict};
use crate::format::{select_format, PayloadFormat};
use crate::model::{Instance, Operation, RevisionId};
use crate::persist::{persist, RevisionSink};
use crate::sequencer::{stamp, Pending};
use revtrail_core_types::ActorId;

pub struct PaperTrail {
    config: TrailConfig,
    format: Box<dyn PayloadFormat>,
    expander: Box<dyn ChangeExpander>,
    resolver: Box<dyn ActorResolver>,
}

impl std::fmt::Debug for PaperTrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaperTrail")
            .field("config", &self.config)
            .field("format", &self.format.name())
            .field("change_records", &self.expander.is_enabled())
            .finish()
    }
}

impl PaperTrail {
    /// Engine with no actor resolver
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration does not validate.
    pub fn new(config: TrailConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: TrailConfig) -> PaperTrailBuilder {
        PaperTrailBuilder {
            config,
            resolver: None,
        }
    }

    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    pub fn format(&self) -> &dyn PayloadFormat {
        self.format.as_ref()
    }

    pub fn expander(&self) -> &dyn ChangeExpander {
        self.expander.as_ref()
    }

    /// Pre-mutation phase: filter, detect and stamp
    ///
    /// Must run before the entity row is written. The returned [`Pending`]
    /// carries the delta to [`PaperTrail::after_mutation`].
    ///
    /// # Errors
    ///
    /// `MissingRevisionCounter` under `fail_hard` for an update without a
    /// committed counter.
    pub fn before_mutation(&self, operation: Operation, instance: &mut Instance) -> Result<Pending> {
        let (previous, current) = self.comparable(operation, instance);
        let exclude = self.config.excluded_fields();
        let delta = detect(
            &filter(&previous, &exclude),
            &filter(&current, &exclude),
            &exclude,
            self.config.strict_diff,
        );

        let pending = stamp(
            instance,
            operation,
            delta,
            &self.config.revision_attribute,
            self.config.fail_hard,
        )?;

        tracing::debug!(
            model = instance.model(),
            document_id = instance.document_id(),
            operation = operation.as_str(),
            delta_len = pending.delta().len(),
            revision = ?pending.revision(),
            "mutation sequenced"
        );
        Ok(pending)
    }

    /// Post-mutation phase: build, expand and persist
    ///
    /// Returns `None` when no revision was due. `actor` takes precedence over
    /// the configured resolver.
    ///
    /// # Errors
    ///
    /// `InvariantViolation`, `MissingActor`, `Serialization` or whatever the
    /// sink reports. The caller's transaction must then roll back.
    pub fn after_mutation<S>(
        &self,
        instance: &Instance,
        pending: Pending,
        actor: Option<&ActorId>,
        sink: &mut S,
    ) -> Result<Option<RevisionId>>
    where
        S: RevisionSink + ?Sized,
    {
        if !pending.should_record() {
            return Ok(None);
        }

        let builder = RevisionBuilder::new(&self.config, self.format(), self.resolver.as_ref());
        let revision = builder.build(instance, pending.operation(), actor)?;
        let changes = self.expander.expand(pending.delta(), self.format())?;

        let revision_id = persist(sink, &revision, &changes)?;
        tracing::debug!(
            model = instance.model(),
            document_id = instance.document_id(),
            revision = revision.revision,
            change_count = changes.len(),
            "revision recorded"
        );
        Ok(Some(revision_id))
    }

    /// Snapshots to compare, restricted to the touched fields under compression
    fn comparable(&self, operation: Operation, instance: &Instance) -> (crate::Attributes, crate::Attributes) {
        match instance.changed_fields() {
            Some(fields)
                if self.config.enable_compression
                    && !operation.is_destroy()
                    && !fields.is_empty() =>
            {
                (
                    restrict(instance.previous(), fields),
                    restrict(instance.current(), fields),
                )
            }
            _ => (instance.previous().clone(), instance.current().clone()),
        }
    }
}

pub struct PaperTrailBuilder {
    config: TrailConfig,
    resolver: Option<Box<dyn ActorResolver>>,
}

impl PaperTrailBuilder {
    /// Supply the actor when callers pass none
    pub fn actor_resolver(mut self, resolver: impl ActorResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// # Errors
    ///
    /// `InvalidConfig` if the configuration does not validate.
    pub fn build(self) -> Result<PaperTrail> {
        self.config.validate()?;

        let format = select_format(self.config.constrained_storage);
        let expander: Box<dyn ChangeExpander> = if self.config.enable_revision_changes {
            Box::new(CharDiffExpander)
        } else {
            Box::new(NoopExpander)
        };

        Ok(PaperTrail {
            format,
            expander,
            resolver: self.resolver.unwrap_or_else(|| Box::new(NoActor)),
            config: self.config,
        })
    }
}
