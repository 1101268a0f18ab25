//! Event bus contract consumed by the outbox dispatcher.

use async_trait::async_trait;
use thiserror::Error;

/// Failure signal returned by an [`EventBus`].
#[derive(Debug, Clone, Error)]
#[error("publish failed: {0}")]
pub struct PublishError(pub String);

/// Accepts integration events for delivery to external consumers.
///
/// Transport and subscriber fan-out are up to the implementation.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes one serialized integration event.
    async fn publish(&self, event_type: &str, payload: &str) -> Result<(), PublishError>;
}
