//! Outbox dispatcher.
//!
//! Every cycle loads the oldest pending records, rebuilds each one into its
//! integration event type, publishes it, and then saves the bookkeeping of
//! the whole batch in one write. A record that fails stays pending with its
//! retry count bumped; the rest of the batch is unaffected.

use std::sync::Arc;
use std::time::Duration;

use kanban_core::bus::EventBus;
use kanban_core::clock::Clock;
use kanban_core::error::DomainError;
use kanban_core::event::IntegrationEventTypes;
use kanban_core::outbox::{DEFAULT_MAX_ERROR_LENGTH, OutboxRecord, OutboxRepository};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::error::DispatchError;

/// Default number of records fetched per cycle.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Default sleep between cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Dispatcher tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Maximum records handled per cycle.
    pub batch_size: usize,
    /// Sleep between cycles.
    pub poll_interval: Duration,
    /// Truncation bound for stored error messages, in characters.
    pub max_error_length: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_error_length: DEFAULT_MAX_ERROR_LENGTH,
        }
    }
}

/// Outcome of one dispatch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Records loaded.
    pub fetched: usize,
    /// Records delivered and marked processed.
    pub published: usize,
    /// Records that failed and stay pending.
    pub failed: usize,
}

/// Background worker that moves pending outbox records onto the event bus.
pub struct OutboxDispatcher {
    repository: Arc<dyn OutboxRepository>,
    bus: Arc<dyn EventBus>,
    types: Arc<IntegrationEventTypes>,
    clock: Arc<dyn Clock>,
    config: DispatcherConfig,
}

impl std::fmt::Debug for OutboxDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboxDispatcher")
            .field("types", &self.types)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OutboxDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        repository: Arc<dyn OutboxRepository>,
        bus: Arc<dyn EventBus>,
        types: Arc<IntegrationEventTypes>,
        clock: Arc<dyn Clock>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            repository,
            bus,
            types,
            clock,
            config,
        }
    }

    /// Runs [`run`](Self::run) on a new tokio task.
    #[must_use]
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Dispatches until `shutdown` is cancelled.
    ///
    /// Cancellation is observed before each cycle and while sleeping, so an
    /// in-flight batch always completes. A failed cycle is logged and the
    /// loop carries on.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            batch_size = self.config.batch_size,
            poll_interval_ms =
                u64::try_from(self.config.poll_interval.as_millis()).unwrap_or(u64::MAX),
            "outbox dispatcher started"
        );

        while !shutdown.is_cancelled() {
            match self.dispatch_batch().await {
                Ok(report) if report.fetched > 0 => info!(
                    fetched = report.fetched,
                    published = report.published,
                    failed = report.failed,
                    "outbox batch dispatched"
                ),
                Ok(_) => debug!("no pending outbox records"),
                Err(err) => error!(error = %err, "outbox dispatch cycle failed"),
            }

            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!("outbox dispatcher stopped");
    }

    /// Runs one dispatch cycle.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the batch cannot be loaded or its results
    /// cannot be saved. Per-record delivery failures are not errors; they are
    /// recorded on the record.
    #[instrument(skip(self), fields(batch_size = self.config.batch_size))]
    pub async fn dispatch_batch(&self) -> Result<DispatchReport, DomainError> {
        let mut records = self.repository.fetch_pending(self.config.batch_size).await?;
        if records.is_empty() {
            return Ok(DispatchReport::default());
        }

        let mut report = DispatchReport {
            fetched: records.len(),
            ..DispatchReport::default()
        };

        for record in &mut records {
            match self.deliver(record).await {
                Ok(()) => {
                    record.mark_processed(self.clock.now());
                    report.published += 1;
                    debug!(
                        outbox_id = %record.id,
                        event_type = %record.event_type,
                        "outbox record delivered"
                    );
                }
                Err(err) => {
                    record.mark_failed(
                        &err.to_string(),
                        self.clock.now(),
                        self.config.max_error_length,
                    );
                    report.failed += 1;
                    warn!(
                        outbox_id = %record.id,
                        event_type = %record.event_type,
                        retry_count = record.retry_count,
                        error = %err,
                        "outbox record delivery failed"
                    );
                }
            }
        }

        self.repository.save_dispatch_results(&records).await?;
        Ok(report)
    }

    async fn deliver(&self, record: &OutboxRecord) -> Result<(), DispatchError> {
        let event = self.types.decode(&record.event_type, &record.payload)?;
        let payload = event.to_payload().map_err(|source| DispatchError::Payload {
            event_type: record.event_type.clone(),
            source,
        })?;
        self.bus.publish(event.event_type(), &payload).await?;
        Ok(())
    }
}
