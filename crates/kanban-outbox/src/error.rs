//! Per-record delivery errors.

use kanban_core::bus::PublishError;
use kanban_core::event::DecodeError;
use thiserror::Error;

/// Why a single outbox record could not be delivered.
///
/// The message is what gets stored in the record's `error` column.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The stored type name is not a registered integration event type.
    #[error("unknown integration event type: {0}")]
    UnknownEventType(String),

    /// The stored body does not match its type.
    #[error("corrupt payload for {event_type}: {source}")]
    Payload {
        /// The stored type name.
        event_type: String,
        /// The serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// The event bus rejected the event.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl From<DecodeError> for DispatchError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnknownType(event_type) => Self::UnknownEventType(event_type),
            DecodeError::Payload { event_type, source } => Self::Payload { event_type, source },
        }
    }
}
