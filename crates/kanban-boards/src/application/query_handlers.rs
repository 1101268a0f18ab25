//! Query handlers for the boards context.
//!
//! Queries read through an untracked [`BoardReader`] and return read-only
//! view DTOs. The same views serialize command responses.

use chrono::{DateTime, Utc};
use kanban_core::error::DomainError;
use serde::Serialize;
use uuid::Uuid;

use super::unit_of_work::BoardReader;
use crate::domain::entities::{Board, BoardList, Card, Membership};

/// Read-only view of a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    /// The card identifier.
    pub card_id: Uuid,
    /// The list holding the card.
    pub list_id: Uuid,
    /// The board holding the list.
    pub board_id: Uuid,
    /// The card title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Position within the list.
    pub position: i32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<&Card> for CardView {
    fn from(card: &Card) -> Self {
        Self {
            card_id: card.id,
            list_id: card.list_id(),
            board_id: card.board_id(),
            title: card.title().to_owned(),
            description: card.description().map(str::to_owned),
            position: card.position(),
            created_at: card.created_at(),
            updated_at: card.updated_at(),
        }
    }
}

/// Read-only view of a list with its cards in position order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListView {
    /// The list identifier.
    pub list_id: Uuid,
    /// The board the list belongs to.
    pub board_id: Uuid,
    /// The list name.
    pub name: String,
    /// Position on the board.
    pub position: i32,
    /// Cards in the list.
    pub cards: Vec<CardView>,
}

impl From<&BoardList> for ListView {
    fn from(list: &BoardList) -> Self {
        Self {
            list_id: list.id,
            board_id: list.board_id,
            name: list.name().to_owned(),
            position: list.position(),
            cards: Vec::new(),
        }
    }
}

/// Read-only view of a membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberView {
    /// The membership identifier.
    pub membership_id: Uuid,
    /// The member.
    pub user_id: Uuid,
    /// When access was granted.
    pub created_at: DateTime<Utc>,
}

impl From<&Membership> for MemberView {
    fn from(membership: &Membership) -> Self {
        Self {
            membership_id: membership.id,
            user_id: membership.user_id,
            created_at: membership.created_at(),
        }
    }
}

/// Read-only view of a board with its lists, cards and members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    /// The board identifier.
    pub board_id: Uuid,
    /// The owning tenant.
    pub tenant_id: Uuid,
    /// The board name.
    pub name: String,
    /// Lists in position order.
    pub lists: Vec<ListView>,
    /// Users with access to the board.
    pub members: Vec<MemberView>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<&Board> for BoardView {
    fn from(board: &Board) -> Self {
        Self {
            board_id: board.id,
            tenant_id: board.tenant_id,
            name: board.name().to_owned(),
            lists: Vec::new(),
            members: Vec::new(),
            created_at: board.created_at(),
            updated_at: board.updated_at(),
        }
    }
}

/// Retrieves a board with its lists, cards and members.
///
/// # Errors
///
/// Returns `DomainError::EntityNotFound` if the board does not exist.
/// Returns `DomainError::Infrastructure` if the read fails.
pub async fn get_board_by_id(
    board_id: Uuid,
    reader: &dyn BoardReader,
) -> Result<BoardView, DomainError> {
    let board = reader
        .board(board_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Board", board_id))?;
    let cards = reader.cards_of_board(board_id).await?;

    let mut view = BoardView::from(&board);
    view.lists = reader
        .lists_of_board(board_id)
        .await?
        .iter()
        .map(|list| {
            let mut list_view = ListView::from(list);
            let mut list_cards: Vec<CardView> = cards
                .iter()
                .filter(|card| card.list_id() == list.id)
                .map(CardView::from)
                .collect();
            list_cards.sort_by_key(|card| card.position);
            list_view.cards = list_cards;
            list_view
        })
        .collect();
    view.members = reader
        .members_of_board(board_id)
        .await?
        .iter()
        .map(MemberView::from)
        .collect();
    Ok(view)
}

/// Retrieves a card.
///
/// # Errors
///
/// Returns `DomainError::EntityNotFound` if the card does not exist.
/// Returns `DomainError::Infrastructure` if the read fails.
pub async fn get_card_by_id(
    card_id: Uuid,
    reader: &dyn BoardReader,
) -> Result<CardView, DomainError> {
    reader
        .card(card_id)
        .await?
        .map(|card| CardView::from(&card))
        .ok_or_else(|| DomainError::not_found("Card", card_id))
}
