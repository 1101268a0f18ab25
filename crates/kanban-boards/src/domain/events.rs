//! Domain events for the boards context.

use kanban_core::entity::Operation;
use kanban_core::event::DomainEvent;
use uuid::Uuid;

/// Event type name for `KanbanDomainEvent::BoardCreated`.
pub const BOARD_CREATED_DOMAIN_EVENT: &str = "BoardCreatedDomainEvent";
/// Event type name for `KanbanDomainEvent::BoardUpdated`.
pub const BOARD_UPDATED_DOMAIN_EVENT: &str = "BoardUpdatedDomainEvent";
/// Event type name for `KanbanDomainEvent::BoardDeleted`.
pub const BOARD_DELETED_DOMAIN_EVENT: &str = "BoardDeletedDomainEvent";
/// Event type name for `KanbanDomainEvent::ListCreated`.
pub const LIST_CREATED_DOMAIN_EVENT: &str = "ListCreatedDomainEvent";
/// Event type name for `KanbanDomainEvent::ListUpdated`.
pub const LIST_UPDATED_DOMAIN_EVENT: &str = "ListUpdatedDomainEvent";
/// Event type name for `KanbanDomainEvent::ListDeleted`.
pub const LIST_DELETED_DOMAIN_EVENT: &str = "ListDeletedDomainEvent";
/// Event type name for `KanbanDomainEvent::CardCreated`.
pub const CARD_CREATED_DOMAIN_EVENT: &str = "CardCreatedDomainEvent";
/// Event type name for `KanbanDomainEvent::CardUpdated`.
pub const CARD_UPDATED_DOMAIN_EVENT: &str = "CardUpdatedDomainEvent";
/// Event type name for `KanbanDomainEvent::CardDeleted`.
pub const CARD_DELETED_DOMAIN_EVENT: &str = "CardDeletedDomainEvent";
/// Event type name for `KanbanDomainEvent::MembershipCreated`.
pub const MEMBERSHIP_CREATED_DOMAIN_EVENT: &str = "MembershipCreatedDomainEvent";
/// Event type name for `KanbanDomainEvent::MembershipDeleted`.
pub const MEMBERSHIP_DELETED_DOMAIN_EVENT: &str = "MembershipDeletedDomainEvent";

/// State of a board at the time an event was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    /// The board identifier.
    pub board_id: Uuid,
    /// The owning tenant.
    pub tenant_id: Uuid,
    /// The board name.
    pub name: String,
}

/// State of a list at the time an event was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot {
    /// The list identifier.
    pub list_id: Uuid,
    /// The board the list belongs to.
    pub board_id: Uuid,
    /// The list name.
    pub name: String,
    /// Position of the list on its board.
    pub position: i32,
}

/// State of a card at the time an event was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSnapshot {
    /// The card identifier.
    pub card_id: Uuid,
    /// The list holding the card.
    pub list_id: Uuid,
    /// The board holding the list.
    pub board_id: Uuid,
    /// The card title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Position of the card within its list.
    pub position: i32,
}

/// State of a membership at the time an event was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipSnapshot {
    /// The membership identifier.
    pub membership_id: Uuid,
    /// The board the user has access to.
    pub board_id: Uuid,
    /// The member.
    pub user_id: Uuid,
}

/// Every lifecycle fact the boards context records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KanbanDomainEvent {
    /// A board was created.
    BoardCreated(BoardSnapshot),
    /// A board was renamed.
    BoardUpdated(BoardSnapshot),
    /// A board was deleted.
    BoardDeleted(BoardSnapshot),
    /// A list was created.
    ListCreated(ListSnapshot),
    /// A list was renamed or moved.
    ListUpdated(ListSnapshot),
    /// A list was deleted.
    ListDeleted(ListSnapshot),
    /// A card was created.
    CardCreated(CardSnapshot),
    /// A card was edited or moved.
    CardUpdated(CardSnapshot),
    /// A card was deleted.
    CardDeleted(CardSnapshot),
    /// A user was given access to a board.
    MembershipCreated(MembershipSnapshot),
    /// A user's access to a board was revoked.
    MembershipDeleted(MembershipSnapshot),
}

impl DomainEvent for KanbanDomainEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::BoardCreated(_) => BOARD_CREATED_DOMAIN_EVENT,
            Self::BoardUpdated(_) => BOARD_UPDATED_DOMAIN_EVENT,
            Self::BoardDeleted(_) => BOARD_DELETED_DOMAIN_EVENT,
            Self::ListCreated(_) => LIST_CREATED_DOMAIN_EVENT,
            Self::ListUpdated(_) => LIST_UPDATED_DOMAIN_EVENT,
            Self::ListDeleted(_) => LIST_DELETED_DOMAIN_EVENT,
            Self::CardCreated(_) => CARD_CREATED_DOMAIN_EVENT,
            Self::CardUpdated(_) => CARD_UPDATED_DOMAIN_EVENT,
            Self::CardDeleted(_) => CARD_DELETED_DOMAIN_EVENT,
            Self::MembershipCreated(_) => MEMBERSHIP_CREATED_DOMAIN_EVENT,
            Self::MembershipDeleted(_) => MEMBERSHIP_DELETED_DOMAIN_EVENT,
        }
    }

    fn entity_id(&self) -> Uuid {
        match self {
            Self::BoardCreated(s) | Self::BoardUpdated(s) | Self::BoardDeleted(s) => s.board_id,
            Self::ListCreated(s) | Self::ListUpdated(s) | Self::ListDeleted(s) => s.list_id,
            Self::CardCreated(s) | Self::CardUpdated(s) | Self::CardDeleted(s) => s.card_id,
            Self::MembershipCreated(s) | Self::MembershipDeleted(s) => s.membership_id,
        }
    }

    fn operation(&self) -> Operation {
        match self {
            Self::BoardCreated(_)
            | Self::ListCreated(_)
            | Self::CardCreated(_)
            | Self::MembershipCreated(_) => Operation::Created,
            Self::BoardUpdated(_) | Self::ListUpdated(_) | Self::CardUpdated(_) => {
                Operation::Updated
            }
            Self::BoardDeleted(_)
            | Self::ListDeleted(_)
            | Self::CardDeleted(_)
            | Self::MembershipDeleted(_) => Operation::Deleted,
        }
    }
}
