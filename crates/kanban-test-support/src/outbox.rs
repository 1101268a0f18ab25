//! Test outbox repositories — mock `OutboxRepository` implementations.

use std::sync::Mutex;

use async_trait::async_trait;
use kanban_core::error::DomainError;
use kanban_core::outbox::{OutboxRecord, OutboxRepository};
use uuid::Uuid;

/// An outbox table held in memory. Records can be seeded directly and
/// inspected after a dispatch cycle.
#[derive(Debug, Default)]
pub struct InMemoryOutboxRepository {
    records: Mutex<Vec<OutboxRecord>>,
    saves: Mutex<usize>,
}

impl InMemoryOutboxRepository {
    /// Creates a repository holding `records`.
    #[must_use]
    pub fn with_records(records: Vec<OutboxRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            saves: Mutex::new(0),
        }
    }

    /// Returns a snapshot of all stored records in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn records(&self) -> Vec<OutboxRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Returns the stored record with `id`.
    ///
    /// # Panics
    ///
    /// Panics if no such record exists.
    pub fn record(&self, id: Uuid) -> OutboxRecord {
        self.records()
            .into_iter()
            .find(|r| r.id == id)
            .expect("no outbox record with that id")
    }

    /// Returns how many times `save_dispatch_results` was called.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl OutboxRepository for InMemoryOutboxRepository {
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<OutboxRecord>, DomainError> {
        let mut pending: Vec<OutboxRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_pending())
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.occurred_on);
        pending.truncate(limit);
        Ok(pending)
    }

    async fn save_dispatch_results(&self, records: &[OutboxRecord]) -> Result<(), DomainError> {
        let mut stored = self.records.lock().unwrap();
        for updated in records {
            if let Some(existing) = stored.iter_mut().find(|r| r.id == updated.id) {
                existing.clone_from(updated);
            }
        }
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// An outbox repository that always returns an infrastructure error. Useful
/// for testing the dispatcher's top-level error handling.
#[derive(Debug)]
pub struct FailingOutboxRepository;

#[async_trait]
impl OutboxRepository for FailingOutboxRepository {
    async fn fetch_pending(&self, _limit: usize) -> Result<Vec<OutboxRecord>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn save_dispatch_results(&self, _records: &[OutboxRecord]) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
