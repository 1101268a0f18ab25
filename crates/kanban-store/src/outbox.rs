//! Dispatcher-side access to `outbox_messages`.

use async_trait::async_trait;
use kanban_core::error::DomainError;
use kanban_core::outbox::{OutboxRecord, OutboxRepository};
use sqlx::PgPool;
use tracing::debug;

use crate::db_error;
use crate::rows::OutboxRow;

/// Reads pending outbox rows and writes back delivery outcomes.
#[derive(Debug, Clone)]
pub struct PgOutboxRepository {
    pool: PgPool,
}

impl PgOutboxRepository {
    /// Creates a repository over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxRepository for PgOutboxRepository {
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<OutboxRecord>, DomainError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, OutboxRow>(
            r"
            SELECT id, occurred_on, type AS event_type, payload, correlation_id,
                   retry_count, last_retry, processed_on, error
            FROM outbox_messages
            WHERE processed_on IS NULL
            ORDER BY occurred_on
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(OutboxRecord::from).collect())
    }

    async fn save_dispatch_results(&self, records: &[OutboxRecord]) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        for record in records {
            sqlx::query(
                r"
                UPDATE outbox_messages
                SET retry_count = $2, last_retry = $3, processed_on = $4, error = $5
                WHERE id = $1
                ",
            )
            .bind(record.id)
            .bind(record.retry_count)
            .bind(record.last_retry)
            .bind(record.processed_on)
            .bind(&record.error)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }
        tx.commit().await.map_err(db_error)?;
        debug!(count = records.len(), "saved dispatch results");
        Ok(())
    }
}
