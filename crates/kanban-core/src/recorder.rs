//! Entity event recorder.
//!
//! Entities never name a concrete event type. Instead they call
//! [`RecordLifecycle::mark_created`] (and friends) and the recorder resolves a
//! constructor for the entity's type and the operation from a registry built
//! once at startup. Resolutions are memoized in a bounded cache owned by the
//! recorder. A missing registration is a silent no-op.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use crate::entity::{Entity, Operation};
use crate::event::DomainEvent;

/// Default upper bound on memoized resolutions.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

type FromEntity<E> = Arc<dyn Fn(&dyn Any) -> Option<E> + Send + Sync>;

/// A constructor able to build a domain event for one entity type and
/// operation.
enum Constructor<E> {
    /// Builds the event from the entity instance.
    FromEntity(FromEntity<E>),
    /// Builds the event without looking at the entity.
    Parameterless(fn() -> E),
}

impl<E> Clone for Constructor<E> {
    fn clone(&self) -> Self {
        match self {
            Self::FromEntity(build) => Self::FromEntity(Arc::clone(build)),
            Self::Parameterless(build) => Self::Parameterless(*build),
        }
    }
}

impl<E> Constructor<E> {
    fn build(&self, entity: &dyn Any) -> Option<E> {
        match self {
            Self::FromEntity(build) => build(entity),
            Self::Parameterless(build) => Some(build()),
        }
    }
}

struct Registration<E> {
    entity: TypeId,
    entity_kind: &'static str,
    operation: Operation,
    constructor: Constructor<E>,
}

/// Builder for an [`EventRecorder`].
pub struct EventRecorderBuilder<E> {
    registrations: Vec<Registration<E>>,
    cache_capacity: usize,
}

impl<E: 'static> EventRecorderBuilder<E> {
    /// Registers a constructor that builds the event from a `T` instance.
    #[must_use]
    pub fn on<T: Entity<Event = E>>(mut self, operation: Operation, build: fn(&T) -> E) -> Self {
        let constructor: FromEntity<E> =
            Arc::new(move |entity: &dyn Any| entity.downcast_ref::<T>().map(build));
        self.registrations.push(Registration {
            entity: TypeId::of::<T>(),
            entity_kind: T::KIND,
            operation,
            constructor: Constructor::FromEntity(constructor),
        });
        self
    }

    /// Registers a parameterless fallback used when no instance-based
    /// constructor exists for `T` and `operation`.
    #[must_use]
    pub fn fallback<T: Entity<Event = E>>(
        mut self,
        operation: Operation,
        build: fn() -> E,
    ) -> Self {
        self.registrations.push(Registration {
            entity: TypeId::of::<T>(),
            entity_kind: T::KIND,
            operation,
            constructor: Constructor::Parameterless(build),
        });
        self
    }

    /// Overrides the cache bound.
    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Finishes the registry.
    #[must_use]
    pub fn build(self) -> EventRecorder<E> {
        EventRecorder {
            registrations: self.registrations,
            cache: Mutex::new(HashMap::new()),
            cache_capacity: self.cache_capacity,
        }
    }
}

/// Resolves and records lifecycle events for entities.
pub struct EventRecorder<E> {
    registrations: Vec<Registration<E>>,
    cache: Mutex<HashMap<(TypeId, Operation), Option<Constructor<E>>>>,
    cache_capacity: usize,
}

impl<E: 'static> EventRecorder<E> {
    /// Starts a new registry.
    #[must_use]
    pub fn builder() -> EventRecorderBuilder<E> {
        EventRecorderBuilder {
            registrations: Vec::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Returns the number of memoized resolutions.
    #[must_use]
    pub fn cached_resolutions(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns whether any constructor is registered for `T` and `operation`.
    #[must_use]
    pub fn supports<T: Entity<Event = E>>(&self, operation: Operation) -> bool {
        self.resolve(TypeId::of::<T>(), operation).is_some()
    }

    /// Resolves, builds and records the event for `entity` and `operation`.
    ///
    /// Returns `true` if an event was recorded. A missing or unusable
    /// constructor records nothing.
    pub fn record<T: Entity<Event = E>>(&self, entity: &mut T, operation: Operation) -> bool
    where
        E: DomainEvent,
    {
        let Some(constructor) = self.resolve(TypeId::of::<T>(), operation) else {
            trace!(entity = T::KIND, %operation, "no event registered; skipping");
            return false;
        };
        let Some(event) = constructor.build(&*entity as &dyn Any) else {
            return false;
        };
        entity.recorded_events_mut().record(event);
        true
    }

    fn resolve(&self, entity: TypeId, operation: Operation) -> Option<Constructor<E>> {
        let key = (entity, operation);
        if let Some(hit) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return hit.clone();
        }

        let resolved = self.scan(entity, operation);

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if cache.len() < self.cache_capacity {
            cache.insert(key, resolved.clone());
        }
        resolved
    }

    /// Instance-based constructors win over parameterless fallbacks.
    fn scan(&self, entity: TypeId, operation: Operation) -> Option<Constructor<E>> {
        let candidates = || {
            self.registrations
                .iter()
                .filter(move |r| r.entity == entity && r.operation == operation)
        };
        candidates()
            .find(|r| matches!(r.constructor, Constructor::FromEntity(_)))
            .or_else(|| candidates().next())
            .map(|r| r.constructor.clone())
    }
}

impl<E> fmt::Debug for EventRecorder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<String> = self
            .registrations
            .iter()
            .map(|r| format!("{}{}", r.entity_kind, r.operation))
            .collect();
        f.debug_struct("EventRecorder")
            .field("registered", &registered)
            .field("cache_capacity", &self.cache_capacity)
            .finish_non_exhaustive()
    }
}

/// Lifecycle marking for any [`Entity`].
///
/// Each call side-effects only the entity's own recorded event list.
pub trait RecordLifecycle: Entity + Sized {
    /// Records the entity's `Created` event, if one is registered.
    fn mark_created(&mut self, recorder: &EventRecorder<Self::Event>) -> bool {
        recorder.record(self, Operation::Created)
    }

    /// Records the entity's `Updated` event, if one is registered.
    fn mark_updated(&mut self, recorder: &EventRecorder<Self::Event>) -> bool {
        recorder.record(self, Operation::Updated)
    }

    /// Records the entity's `Deleted` event, if one is registered.
    fn mark_deleted(&mut self, recorder: &EventRecorder<Self::Event>) -> bool {
        recorder.record(self, Operation::Deleted)
    }
}

impl<T: Entity> RecordLifecycle for T {}
