//! Domain and integration event abstractions.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::entity::Operation;

/// Trait that all domain events implement.
///
/// A domain event is an in-memory fact about one entity mutation. It lives
/// for a single unit of work and is never persisted directly.
pub trait DomainEvent: Send + Sync + fmt::Debug {
    /// Returns the event type name, `<Entity><Operation>DomainEvent`.
    fn event_type(&self) -> &'static str;

    /// Returns the identifier of the entity the event is about.
    fn entity_id(&self) -> Uuid;

    /// Returns the lifecycle operation that produced the event.
    fn operation(&self) -> Operation;
}

/// Trait that all integration events implement.
///
/// Integration events are the externally visible counterpart of domain
/// events. They are serialized into the outbox and never mutated afterwards.
pub trait IntegrationEvent: Send + Sync + fmt::Debug {
    /// Unique event identifier.
    fn event_id(&self) -> Uuid;

    /// Timestamp of event creation.
    fn occurred_on(&self) -> DateTime<Utc>;

    /// Returns the event type name, `<Entity><Operation>IntegrationEvent`.
    fn event_type(&self) -> &'static str;

    /// Serializes the event body.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the body cannot be encoded.
    fn to_payload(&self) -> Result<String, serde_json::Error>;
}

/// A concrete integration event type that can be rebuilt from its stored
/// payload.
pub trait IntegrationEventType: IntegrationEvent + Serialize + DeserializeOwned + 'static {
    /// The type name stored alongside the payload.
    const EVENT_TYPE: &'static str;
}

type Decoder = fn(&str) -> Result<Box<dyn IntegrationEvent>, serde_json::Error>;

fn decode<T: IntegrationEventType>(
    payload: &str,
) -> Result<Box<dyn IntegrationEvent>, serde_json::Error> {
    let event: T = serde_json::from_str(payload)?;
    Ok(Box::new(event))
}

/// Failure to rebuild an integration event from a stored record.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// No type is registered under the stored name.
    #[error("unknown integration event type: {0}")]
    UnknownType(String),

    /// The payload does not deserialize into the registered type.
    #[error("corrupt payload for {event_type}: {source}")]
    Payload {
        /// The stored type name.
        event_type: String,
        /// The deserializer error.
        #[source]
        source: serde_json::Error,
    },
}

/// Startup-built registry mapping stored type names to integration event
/// types.
#[derive(Default, Clone)]
pub struct IntegrationEventTypes {
    decoders: HashMap<&'static str, Decoder>,
}

impl IntegrationEventTypes {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under its `EVENT_TYPE` name.
    #[must_use]
    pub fn with<T: IntegrationEventType>(mut self) -> Self {
        self.decoders.insert(T::EVENT_TYPE, decode::<T>);
        self
    }

    /// Returns whether a type is registered under `event_type`.
    #[must_use]
    pub fn contains(&self, event_type: &str) -> bool {
        self.decoders.contains_key(event_type)
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Rebuilds a typed integration event from a stored type name and payload.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::UnknownType` if the name is not registered and
    /// `DecodeError::Payload` if the payload does not match the type.
    pub fn decode(
        &self,
        event_type: &str,
        payload: &str,
    ) -> Result<Box<dyn IntegrationEvent>, DecodeError> {
        let decoder = self
            .decoders
            .get(event_type)
            .ok_or_else(|| DecodeError::UnknownType(event_type.to_owned()))?;
        decoder(payload).map_err(|source| DecodeError::Payload {
            event_type: event_type.to_owned(),
            source,
        })
    }
}

impl fmt::Debug for IntegrationEventTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&&str> = self.decoders.keys().collect();
        names.sort();
        f.debug_struct("IntegrationEventTypes")
            .field("types", &names)
            .finish()
    }
}
