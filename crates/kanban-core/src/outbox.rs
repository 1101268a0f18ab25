//! Outbox record and the contracts of the two parties that touch it.
//!
//! The command pipeline stages inserts through an [`OutboxStore`] inside its
//! transaction; the dispatcher reads and updates records through an
//! [`OutboxRepository`]. The two never touch the same row at the same time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::IntegrationEvent;

/// Default maximum length, in characters, of a stored error message.
pub const DEFAULT_MAX_ERROR_LENGTH: usize = 3000;

/// A persisted, pending or processed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// Enqueue timestamp.
    pub occurred_on: DateTime<Utc>,
    /// Integration event type name used to rebuild the payload.
    pub event_type: String,
    /// Serialized event body.
    pub payload: String,
    /// Optional correlation ID for tracing.
    pub correlation_id: Option<Uuid>,
    /// Number of failed delivery attempts.
    pub retry_count: i32,
    /// Time of the most recent failed attempt.
    pub last_retry: Option<DateTime<Utc>>,
    /// Delivery time; `None` while pending.
    pub processed_on: Option<DateTime<Utc>>,
    /// Last delivery failure, truncated.
    pub error: Option<String>,
}

impl OutboxRecord {
    /// Builds a pending record for `event`, enqueued at `occurred_on`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the event body cannot be
    /// serialized.
    pub fn pending(
        event: &dyn IntegrationEvent,
        occurred_on: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: Uuid::new_v4(),
            occurred_on,
            event_type: event.event_type().to_owned(),
            payload: event.to_payload()?,
            correlation_id: None,
            retry_count: 0,
            last_retry: None,
            processed_on: None,
            error: None,
        })
    }

    /// Returns `true` while the record is eligible for delivery.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.processed_on.is_none()
    }

    /// Marks the record delivered. The last failure message, if any, is kept.
    pub fn mark_processed(&mut self, now: DateTime<Utc>) {
        self.processed_on = Some(now);
    }

    /// Records a failed delivery attempt; the record stays pending.
    pub fn mark_failed(&mut self, error: &str, now: DateTime<Utc>, max_error_length: usize) {
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_retry = Some(now);
        self.error = Some(truncate_error(error, max_error_length));
    }
}

/// Truncates `error` to at most `max_chars` characters.
#[must_use]
pub fn truncate_error(error: &str, max_chars: usize) -> String {
    match error.char_indices().nth(max_chars) {
        Some((byte_index, _)) => error[..byte_index].to_owned(),
        None => error.to_owned(),
    }
}

/// Transaction-scoped enqueue of integration events.
///
/// `add` only stages the insert. It lands when the owning unit of work
/// flushes, inside whatever transaction is open at that point.
pub trait OutboxStore: Send {
    /// Serializes `event` into a pending record and stages its insert.
    /// Returns the new record's ID.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the event cannot be
    /// serialized.
    fn add(&mut self, event: &dyn IntegrationEvent) -> Result<Uuid, DomainError>;
}

/// Dispatcher-side access to the outbox table.
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Loads up to `limit` pending records, oldest `occurred_on` first.
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<OutboxRecord>, DomainError>;

    /// Persists the delivery bookkeeping of a processed batch in one write.
    async fn save_dispatch_results(&self, records: &[OutboxRecord]) -> Result<(), DomainError>;
}
