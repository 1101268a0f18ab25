//! Test buses — mock `EventBus` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use kanban_core::bus::{EventBus, PublishError};

/// One call to `publish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    /// The event type name passed to the bus.
    pub event_type: String,
    /// The serialized payload passed to the bus.
    pub payload: String,
}

impl PublishedEvent {
    /// Parses the payload as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the payload is not valid JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.payload).unwrap()
    }
}

/// An event bus that accepts and records every publish.
#[derive(Debug, Default)]
pub struct RecordingEventBus {
    published: Mutex<Vec<PublishedEvent>>,
}

impl RecordingEventBus {
    /// Creates an empty recording bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of everything published so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<PublishedEvent> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn publish(&self, event_type: &str, payload: &str) -> Result<(), PublishError> {
        self.published.lock().unwrap().push(PublishedEvent {
            event_type: event_type.to_owned(),
            payload: payload.to_owned(),
        });
        Ok(())
    }
}

/// An event bus that rejects every publish. Useful for testing retry
/// bookkeeping.
#[derive(Debug)]
pub struct FailingEventBus;

#[async_trait]
impl EventBus for FailingEventBus {
    async fn publish(&self, _event_type: &str, _payload: &str) -> Result<(), PublishError> {
        Err(PublishError("broker unavailable".into()))
    }
}

/// An event bus that fails the first `failures` publishes and records the
/// rest.
#[derive(Debug)]
pub struct FlakyEventBus {
    remaining_failures: Mutex<usize>,
    attempts: Mutex<usize>,
    inner: RecordingEventBus,
}

impl FlakyEventBus {
    /// Creates a bus that fails `failures` times before succeeding.
    #[must_use]
    pub fn new(failures: usize) -> Self {
        Self {
            remaining_failures: Mutex::new(failures),
            attempts: Mutex::new(0),
            inner: RecordingEventBus::new(),
        }
    }

    /// Returns the number of publish calls, failed or not.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    /// Returns the successfully published events.
    pub fn published(&self) -> Vec<PublishedEvent> {
        self.inner.published()
    }
}

#[async_trait]
impl EventBus for FlakyEventBus {
    async fn publish(&self, event_type: &str, payload: &str) -> Result<(), PublishError> {
        *self.attempts.lock().unwrap() += 1;
        {
            let mut remaining = self.remaining_failures.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(PublishError(format!("transient failure, {remaining} left")));
            }
        }
        self.inner.publish(event_type, payload).await
    }
}
