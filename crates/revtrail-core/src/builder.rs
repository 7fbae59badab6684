//! Revision builder
//!
//! Assembles the revision record for a stamped instance. The stored document
//! is the filtered post-mutation snapshot, encoded by the configured
//! [`PayloadFormat`].

use crate::actor::{pick_actor, ActorResolver};
use crate::config::TrailConfig;
use crate::errors::{Result, TrailError};
use crate::filter::filter;
use crate::format::PayloadFormat;
use crate::model::{attributes_to_json, Instance, NewRevision, Operation};
use revtrail_core_types::ActorId;

pub struct RevisionBuilder<'a> {
    config: &'a TrailConfig,
    format: &'a dyn PayloadFormat,
    resolver: &'a dyn ActorResolver,
}

impl<'a> RevisionBuilder<'a> {
    pub fn new(
        config: &'a TrailConfig,
        format: &'a dyn PayloadFormat,
        resolver: &'a dyn ActorResolver,
    ) -> Self {
        Self {
            config,
            format,
            resolver,
        }
    }

    /// Build the revision for `instance`
    ///
    /// The revision number is the counter the sequencer stamped on the
    /// instance.
    ///
    /// # Errors
    ///
    /// - `InvariantViolation` if the instance carries no counter
    /// - `MissingActor` under `fail_hard` when no actor is available
    /// - `Serialization` if the snapshot cannot be encoded
    pub fn build(
        &self,
        instance: &Instance,
        operation: Operation,
        actor: Option<&ActorId>,
    ) -> Result<NewRevision> {
        let revision = instance
            .counter(&self.config.revision_attribute)
            .ok_or_else(|| TrailError::InvariantViolation {
                model: instance.model().to_string(),
                document_id: instance.document_id().to_string(),
                reason: format!(
                    "revision attribute '{}' is unset at build time",
                    self.config.revision_attribute
                ),
            })?;

        let actor_id = pick_actor(actor, self.resolver);
        if self.config.fail_hard && actor_id.is_none() {
            return Err(TrailError::MissingActor {
                model: instance.model().to_string(),
                document_id: instance.document_id().to_string(),
            });
        }

        let snapshot = filter(instance.current(), &self.config.excluded_fields());
        let document = self.format.encode(attributes_to_json(&snapshot)?)?;

        Ok(NewRevision {
            model: instance.model().to_string(),
            document_id: instance.document_id().to_string(),
            revision,
            operation,
            document,
            actor_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::NoActor;
    use crate::format::{StructuredFormat, TextFormat};
    use crate::model::{attributes_from_json, Payload};
    use serde_json::json;

    fn stamped() -> Instance {
        Instance::new(
            "User",
            "7",
            attributes_from_json(json!({"name": "Bob", "revision": 3})).unwrap(),
            attributes_from_json(json!({
                "id": 7,
                "name": "Bill",
                "revision": 4,
                "tags": ["x"]
            }))
            .unwrap(),
        )
    }

    #[test]
    fn test_build_structured_revision() {
        let config = TrailConfig::default();
        let builder = RevisionBuilder::new(&config, &StructuredFormat, &NoActor);

        let revision = builder
            .build(&stamped(), Operation::Update, Some(&ActorId::from("u-1")))
            .unwrap();

        assert_eq!(revision.model, "User");
        assert_eq!(revision.document_id, "7");
        assert_eq!(revision.revision, 4);
        assert_eq!(revision.operation, Operation::Update);
        assert_eq!(revision.document, Payload::Structured(json!({"name": "Bill"})));
        assert_eq!(revision.actor_id, Some(ActorId::from("u-1")));
    }

    #[test]
    fn test_renamed_counter_left_out_of_document() {
        let config = TrailConfig {
            revision_attribute: "version".to_string(),
            ..TrailConfig::default()
        };
        let builder = RevisionBuilder::new(&config, &StructuredFormat, &NoActor);
        let instance = Instance::new(
            "Doc",
            "1",
            attributes_from_json(json!({"body": "x", "version": 1})).unwrap(),
            attributes_from_json(json!({"body": "y", "version": 2})).unwrap(),
        );

        let revision = builder.build(&instance, Operation::Update, None).unwrap();

        assert_eq!(revision.revision, 2);
        assert_eq!(revision.document, Payload::Structured(json!({"body": "y"})));
    }

    #[test]
    fn test_build_text_revision() {
        let config = TrailConfig::default();
        let builder = RevisionBuilder::new(&config, &TextFormat, &NoActor);

        let revision = builder.build(&stamped(), Operation::Update, None).unwrap();

        assert_eq!(revision.document, Payload::Text(r#"{"name":"Bill"}"#.to_string()));
        assert_eq!(revision.actor_id, None);
    }

    #[test]
    fn test_resolver_used_when_no_explicit_actor() {
        let config = TrailConfig::default();
        let resolver = || Some(ActorId::from("ambient"));
        let builder = RevisionBuilder::new(&config, &StructuredFormat, &resolver);

        let revision = builder.build(&stamped(), Operation::Update, None).unwrap();
        assert_eq!(revision.actor_id, Some(ActorId::from("ambient")));
    }

    #[test]
    fn test_unset_counter_is_invariant_violation() {
        let config = TrailConfig::default();
        let builder = RevisionBuilder::new(&config, &StructuredFormat, &NoActor);
        let instance = Instance::new(
            "User",
            "7",
            Default::default(),
            attributes_from_json(json!({"name": "Bill"})).unwrap(),
        );

        let err = builder
            .build(&instance, Operation::Create, None)
            .unwrap_err();
        assert!(matches!(err, TrailError::InvariantViolation { .. }));
    }

    #[test]
    fn test_fail_hard_requires_actor() {
        let config = TrailConfig {
            fail_hard: true,
            ..TrailConfig::default()
        };
        let builder = RevisionBuilder::new(&config, &StructuredFormat, &NoActor);

        let err = builder.build(&stamped(), Operation::Update, None).unwrap_err();
        assert!(matches!(err, TrailError::MissingActor { .. }));
    }
}
