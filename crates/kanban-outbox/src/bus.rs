//! Event bus that only writes to the trace log.

use async_trait::async_trait;
use kanban_core::bus::{EventBus, PublishError};
use tracing::info;

/// Logs each published event. Used when no broker is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventBus;

#[async_trait]
impl EventBus for TracingEventBus {
    async fn publish(&self, event_type: &str, payload: &str) -> Result<(), PublishError> {
        info!(event_type, payload_bytes = payload.len(), "integration event published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tracing_bus_accepts_everything() {
        let result = TracingEventBus.publish("CardCreatedIntegrationEvent", "{}").await;

        assert!(result.is_ok());
    }
}
