//! Row mappings between tables and domain types.

use chrono::{DateTime, Utc};
use kanban_boards::domain::entities::{Board, BoardList, Card, Membership};
use kanban_core::outbox::OutboxRecord;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(FromRow)]
pub(crate) struct BoardRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BoardRow> for Board {
    fn from(r: BoardRow) -> Self {
        Board::restore(r.id, r.tenant_id, r.name, r.created_at, r.updated_at)
    }
}

#[derive(FromRow)]
pub(crate) struct ListRow {
    id: Uuid,
    board_id: Uuid,
    name: String,
    position: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ListRow> for BoardList {
    fn from(r: ListRow) -> Self {
        BoardList::restore(
            r.id,
            r.board_id,
            r.name,
            r.position,
            r.created_at,
            r.updated_at,
        )
    }
}

#[derive(FromRow)]
pub(crate) struct CardRow {
    id: Uuid,
    list_id: Uuid,
    board_id: Uuid,
    title: String,
    description: Option<String>,
    position: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CardRow> for Card {
    fn from(r: CardRow) -> Self {
        Card::restore(
            r.id,
            r.list_id,
            r.board_id,
            r.title,
            r.description,
            r.position,
            r.created_at,
            r.updated_at,
        )
    }
}

#[derive(FromRow)]
pub(crate) struct MembershipRow {
    id: Uuid,
    board_id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<MembershipRow> for Membership {
    fn from(r: MembershipRow) -> Self {
        Membership::restore(r.id, r.board_id, r.user_id, r.created_at)
    }
}

#[derive(FromRow)]
pub(crate) struct OutboxRow {
    id: Uuid,
    occurred_on: DateTime<Utc>,
    event_type: String,
    payload: String,
    correlation_id: Option<Uuid>,
    retry_count: i32,
    last_retry: Option<DateTime<Utc>>,
    processed_on: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl From<OutboxRow> for OutboxRecord {
    fn from(r: OutboxRow) -> Self {
        Self {
            id: r.id,
            occurred_on: r.occurred_on,
            event_type: r.event_type,
            payload: r.payload,
            correlation_id: r.correlation_id,
            retry_count: r.retry_count,
            last_retry: r.last_retry,
            processed_on: r.processed_on,
            error: r.error,
        }
    }
}
