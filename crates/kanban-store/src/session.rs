//! Transactional unit of work over `PostgreSQL`.
//!
//! Lookups run inside the open transaction. Writes are staged in memory and
//! executed in staging order on `flush`, still inside that transaction, so
//! the outbox inserts queued after a business write always land after it
//! and commit with it.

use std::sync::Arc;

use async_trait::async_trait;
use kanban_boards::application::service::SessionFactory;
use kanban_boards::application::unit_of_work::{BoardUnitOfWork, PendingChange};
use kanban_boards::domain::entities::{Board, BoardList, Card, Membership};
use kanban_boards::domain::events::KanbanDomainEvent;
use kanban_core::clock::Clock;
use kanban_core::error::DomainError;
use kanban_core::event::IntegrationEvent;
use kanban_core::outbox::{OutboxRecord, OutboxStore};
use kanban_core::pipeline::UnitOfWork;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::db_error;
use crate::rows::{BoardRow, CardRow, ListRow, MembershipRow};

/// Opens [`PgBoardSession`]s on a shared pool.
#[derive(Debug, Clone)]
pub struct PgSessionFactory {
    pool: PgPool,
}

impl PgSessionFactory {
    /// Creates a factory over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SessionFactory for PgSessionFactory {
    type Session = PgBoardSession;

    fn open_session(&self, clock: Arc<dyn Clock>) -> PgBoardSession {
        PgBoardSession::new(self.pool.clone(), clock)
    }
}

/// Tracked unit of work. One per command.
pub struct PgBoardSession {
    pool: PgPool,
    clock: Arc<dyn Clock>,
    tx: Option<Transaction<'static, Postgres>>,
    pending: Vec<PendingChange>,
    domain_events: Vec<KanbanDomainEvent>,
}

impl std::fmt::Debug for PgBoardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgBoardSession")
            .field("in_transaction", &self.tx.is_some())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl PgBoardSession {
    /// Creates a session; no transaction is open until `begin`.
    #[must_use]
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            clock,
            tx: None,
            pending: Vec::new(),
            domain_events: Vec::new(),
        }
    }

    fn connection(&mut self) -> Result<&mut PgConnection, DomainError> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| DomainError::Infrastructure("no open transaction".into()))
    }
}

async fn apply(conn: &mut PgConnection, change: PendingChange) -> Result<(), sqlx::Error> {
    match change {
        PendingChange::SaveBoard(board) => {
            sqlx::query(
                r"
                INSERT INTO boards (id, tenant_id, name, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name, updated_at = EXCLUDED.updated_at
                ",
            )
            .bind(board.id)
            .bind(board.tenant_id)
            .bind(board.name())
            .bind(board.created_at())
            .bind(board.updated_at())
            .execute(&mut *conn)
            .await?;
        }
        PendingChange::DeleteBoard(id) => {
            sqlx::query("DELETE FROM boards WHERE id = $1")
                .bind(id)
                .execute(&mut *conn)
                .await?;
        }
        PendingChange::SaveList(list) => {
            sqlx::query(
                r"
                INSERT INTO lists (id, board_id, name, position, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    position = EXCLUDED.position,
                    updated_at = EXCLUDED.updated_at
                ",
            )
            .bind(list.id)
            .bind(list.board_id)
            .bind(list.name())
            .bind(list.position())
            .bind(list.created_at())
            .bind(list.updated_at())
            .execute(&mut *conn)
            .await?;
        }
        PendingChange::DeleteList(id) => {
            sqlx::query("DELETE FROM lists WHERE id = $1")
                .bind(id)
                .execute(&mut *conn)
                .await?;
        }
        PendingChange::SaveCard(card) => {
            sqlx::query(
                r"
                INSERT INTO cards
                    (id, list_id, board_id, title, description, position, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (id) DO UPDATE
                SET list_id = EXCLUDED.list_id,
                    title = EXCLUDED.title,
                    description = EXCLUDED.description,
                    position = EXCLUDED.position,
                    updated_at = EXCLUDED.updated_at
                ",
            )
            .bind(card.id)
            .bind(card.list_id())
            .bind(card.board_id())
            .bind(card.title())
            .bind(card.description())
            .bind(card.position())
            .bind(card.created_at())
            .bind(card.updated_at())
            .execute(&mut *conn)
            .await?;
        }
        PendingChange::DeleteCard(id) => {
            sqlx::query("DELETE FROM cards WHERE id = $1")
                .bind(id)
                .execute(&mut *conn)
                .await?;
        }
        PendingChange::SaveMembership(membership) => {
            sqlx::query(
                r"
                INSERT INTO memberships (id, board_id, user_id, created_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO NOTHING
                ",
            )
            .bind(membership.id)
            .bind(membership.board_id)
            .bind(membership.user_id)
            .bind(membership.created_at())
            .execute(&mut *conn)
            .await?;
        }
        PendingChange::DeleteMembership(id) => {
            sqlx::query("DELETE FROM memberships WHERE id = $1")
                .bind(id)
                .execute(&mut *conn)
                .await?;
        }
        PendingChange::InsertOutbox(record) => insert_outbox(conn, &record).await?,
    }
    Ok(())
}

async fn insert_outbox(conn: &mut PgConnection, record: &OutboxRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        INSERT INTO outbox_messages
            (id, occurred_on, type, payload, correlation_id,
             retry_count, last_retry, processed_on, error)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ",
    )
    .bind(record.id)
    .bind(record.occurred_on)
    .bind(&record.event_type)
    .bind(&record.payload)
    .bind(record.correlation_id)
    .bind(record.retry_count)
    .bind(record.last_retry)
    .bind(record.processed_on)
    .bind(&record.error)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl UnitOfWork for PgBoardSession {
    type DomainEvent = KanbanDomainEvent;

    async fn begin(&mut self) -> Result<(), DomainError> {
        if self.tx.is_some() {
            return Err(DomainError::Infrastructure(
                "transaction already open".into(),
            ));
        }
        self.tx = Some(self.pool.begin().await.map_err(db_error)?);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), DomainError> {
        let changes = std::mem::take(&mut self.pending);
        if changes.is_empty() {
            return Ok(());
        }
        let count = changes.len();
        let conn = self.connection()?;
        for change in changes {
            apply(conn, change).await.map_err(db_error)?;
        }
        debug!(count, "flushed staged changes");
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DomainError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DomainError::Infrastructure("no open transaction".into()))?;
        tx.commit().await.map_err(db_error)
    }

    async fn rollback(&mut self) -> Result<(), DomainError> {
        self.pending.clear();
        self.domain_events.clear();
        match self.tx.take() {
            Some(tx) => tx.rollback().await.map_err(db_error),
            None => Ok(()),
        }
    }

    fn outbox(&mut self) -> &mut dyn OutboxStore {
        self
    }

    fn take_domain_events(&mut self) -> Vec<KanbanDomainEvent> {
        std::mem::take(&mut self.domain_events)
    }
}

impl OutboxStore for PgBoardSession {
    fn add(&mut self, event: &dyn IntegrationEvent) -> Result<Uuid, DomainError> {
        let record = OutboxRecord::pending(event, self.clock.now())?;
        let id = record.id;
        self.pending.push(PendingChange::InsertOutbox(record));
        Ok(id)
    }
}

#[async_trait]
impl BoardUnitOfWork for PgBoardSession {
    async fn find_board(&mut self, id: Uuid) -> Result<Option<Board>, DomainError> {
        let row = sqlx::query_as::<_, BoardRow>(
            "SELECT id, tenant_id, name, created_at, updated_at FROM boards WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.connection()?)
        .await
        .map_err(db_error)?;
        Ok(row.map(Board::from))
    }

    async fn find_list(&mut self, id: Uuid) -> Result<Option<BoardList>, DomainError> {
        let row = sqlx::query_as::<_, ListRow>(
            "SELECT id, board_id, name, position, created_at, updated_at FROM lists WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.connection()?)
        .await
        .map_err(db_error)?;
        Ok(row.map(BoardList::from))
    }

    async fn find_card(&mut self, id: Uuid) -> Result<Option<Card>, DomainError> {
        let row = sqlx::query_as::<_, CardRow>(
            r"
            SELECT id, list_id, board_id, title, description, position, created_at, updated_at
            FROM cards WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.connection()?)
        .await
        .map_err(db_error)?;
        Ok(row.map(Card::from))
    }

    async fn find_membership(&mut self, id: Uuid) -> Result<Option<Membership>, DomainError> {
        let row = sqlx::query_as::<_, MembershipRow>(
            "SELECT id, board_id, user_id, created_at FROM memberships WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.connection()?)
        .await
        .map_err(db_error)?;
        Ok(row.map(Membership::from))
    }

    fn stage(&mut self, change: PendingChange, mut events: Vec<KanbanDomainEvent>) {
        self.pending.push(change);
        self.domain_events.append(&mut events);
    }
}
