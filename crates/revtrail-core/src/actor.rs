//! Actor resolution
//!
//! A revision is attributed to whoever performed the mutation. Hosts either
//! pass the actor explicitly per call or install an [`ActorResolver`] that
//! reads it from ambient request context.

use revtrail_core_types::ActorId;

/// Source of the current actor when the caller supplies none
pub trait ActorResolver: Send + Sync {
    fn resolve(&self) -> Option<ActorId>;
}

/// Resolver that never yields an actor
#[derive(Debug, Default, Clone, Copy)]
pub struct NoActor;

impl ActorResolver for NoActor {
    fn resolve(&self) -> Option<ActorId> {
        None
    }
}

impl<F> ActorResolver for F
where
    F: Fn() -> Option<ActorId> + Send + Sync,
{
    fn resolve(&self) -> Option<ActorId> {
        self()
    }
}

/// Explicit actor first, then the resolver
pub fn pick_actor(explicit: Option<&ActorId>, resolver: &dyn ActorResolver) -> Option<ActorId> {
    explicit.cloned().or_else(|| resolver.resolve())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_actor_resolves_nothing() {
        assert_eq!(NoActor.resolve(), None);
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = || Some(ActorId::from("u-1"));
        assert_eq!(resolver.resolve(), Some(ActorId::from("u-1")));
    }

    #[test]
    fn test_explicit_actor_wins() {
        let resolver = || Some(ActorId::from("ambient"));
        let explicit = ActorId::from("caller");
        assert_eq!(
            pick_actor(Some(&explicit), &resolver),
            Some(ActorId::from("caller"))
        );
        assert_eq!(pick_actor(None, &resolver), Some(ActorId::from("ambient")));
        assert_eq!(pick_actor(None, &NoActor), None);
    }
}
