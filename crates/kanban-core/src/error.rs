//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An entity was not found.
    #[error("{entity} not found: {id}")]
    EntityNotFound {
        /// The kind of entity that was looked up.
        entity: &'static str,
        /// The identifier that did not resolve.
        id: Uuid,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for an `EntityNotFound` error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::EntityNotFound { entity, id }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Infrastructure(format!("serialization failed: {err}"))
    }
}
