//! Untracked reads for the query side.

use async_trait::async_trait;
use kanban_boards::application::unit_of_work::BoardReader;
use kanban_boards::domain::entities::{Board, BoardList, Card, Membership};
use kanban_core::error::DomainError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db_error;
use crate::rows::{BoardRow, CardRow, ListRow, MembershipRow};

/// Reads boards and their contents straight from the pool.
#[derive(Debug, Clone)]
pub struct PgBoardReader {
    pool: PgPool,
}

impl PgBoardReader {
    /// Creates a reader over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BoardReader for PgBoardReader {
    async fn board(&self, id: Uuid) -> Result<Option<Board>, DomainError> {
        let row = sqlx::query_as::<_, BoardRow>(
            "SELECT id, tenant_id, name, created_at, updated_at FROM boards WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Board::from))
    }

    async fn lists_of_board(&self, board_id: Uuid) -> Result<Vec<BoardList>, DomainError> {
        let rows = sqlx::query_as::<_, ListRow>(
            r"
            SELECT id, board_id, name, position, created_at, updated_at
            FROM lists
            WHERE board_id = $1
            ORDER BY position, created_at
            ",
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(BoardList::from).collect())
    }

    async fn cards_of_board(&self, board_id: Uuid) -> Result<Vec<Card>, DomainError> {
        let rows = sqlx::query_as::<_, CardRow>(
            r"
            SELECT id, list_id, board_id, title, description, position, created_at, updated_at
            FROM cards
            WHERE board_id = $1
            ORDER BY list_id, position, created_at
            ",
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Card::from).collect())
    }

    async fn members_of_board(&self, board_id: Uuid) -> Result<Vec<Membership>, DomainError> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r"
            SELECT id, board_id, user_id, created_at
            FROM memberships
            WHERE board_id = $1
            ORDER BY created_at
            ",
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Membership::from).collect())
    }

    async fn card(&self, id: Uuid) -> Result<Option<Card>, DomainError> {
        let row = sqlx::query_as::<_, CardRow>(
            r"
            SELECT id, list_id, board_id, title, description, position, created_at, updated_at
            FROM cards WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Card::from))
    }
}
