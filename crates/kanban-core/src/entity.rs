//! Entity abstraction and the per-entity list of recorded domain events.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::DomainEvent;

/// Lifecycle operation an entity can record an event for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// The entity was created.
    Created,
    /// The entity was updated.
    Updated,
    /// The entity was deleted.
    Deleted,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "Created",
            Self::Updated => "Updated",
            Self::Deleted => "Deleted",
        };
        f.write_str(name)
    }
}

/// Trait for mutable entities that record lifecycle events.
pub trait Entity: Any + Send + Sync {
    /// The domain event type this entity records.
    type Event: DomainEvent;

    /// Human-readable entity kind, used in logs and errors.
    const KIND: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> Uuid;

    /// Returns the events recorded in the current unit of work.
    fn recorded_events(&self) -> &RecordedEvents<Self::Event>;

    /// Returns the recorded events for mutation.
    fn recorded_events_mut(&mut self) -> &mut RecordedEvents<Self::Event>;
}

/// Domain events recorded by one entity instance during a unit of work.
///
/// Holds at most one event per event type: recording the same type again
/// replaces the earlier event with the newer one.
#[derive(Debug, Clone)]
pub struct RecordedEvents<E> {
    events: Vec<E>,
}

impl<E> Default for RecordedEvents<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E: DomainEvent> RecordedEvents<E> {
    /// Creates an empty event list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `event`. Returns `false` if an event of the same type was
    /// already present and has been replaced.
    pub fn record(&mut self, event: E) -> bool {
        if let Some(existing) = self
            .events
            .iter_mut()
            .find(|e| e.event_type() == event.event_type())
        {
            *existing = event;
            return false;
        }
        self.events.push(event);
        true
    }

    /// Returns the recorded events in recording order.
    #[must_use]
    pub fn as_slice(&self) -> &[E] {
        &self.events
    }

    /// Drains all recorded events, leaving the list empty.
    pub fn take(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
