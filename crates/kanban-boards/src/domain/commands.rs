//! Commands for the boards context.

use kanban_core::command::Command;
use uuid::Uuid;

macro_rules! command {
    ($name:ident, $type_name:literal) => {
        impl Command for $name {
            fn command_type(&self) -> &'static str {
                $type_name
            }

            fn correlation_id(&self) -> Uuid {
                self.correlation_id
            }
        }
    };
}

/// Command to create a board for a tenant.
#[derive(Debug, Clone)]
pub struct CreateBoard {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The owning tenant.
    pub tenant_id: Uuid,
    /// The board name.
    pub name: String,
}

/// Command to rename a board.
#[derive(Debug, Clone)]
pub struct UpdateBoard {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The board to rename.
    pub board_id: Uuid,
    /// The new name.
    pub name: String,
}

/// Command to delete a board with its lists, cards and memberships.
#[derive(Debug, Clone)]
pub struct DeleteBoard {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The board to delete.
    pub board_id: Uuid,
}

/// Command to add a list to a board.
#[derive(Debug, Clone)]
pub struct CreateList {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The board to add the list to.
    pub board_id: Uuid,
    /// The list name.
    pub name: String,
    /// Position on the board.
    pub position: i32,
}

/// Command to rename and/or reposition a list.
#[derive(Debug, Clone)]
pub struct UpdateList {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The list to update.
    pub list_id: Uuid,
    /// New name, if changing.
    pub name: Option<String>,
    /// New position, if changing.
    pub position: Option<i32>,
}

/// Command to delete a list with its cards.
#[derive(Debug, Clone)]
pub struct DeleteList {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The list to delete.
    pub list_id: Uuid,
}

/// Command to add a card to a list.
#[derive(Debug, Clone)]
pub struct CreateCard {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The list to add the card to.
    pub list_id: Uuid,
    /// The card title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Position within the list.
    pub position: i32,
}

/// Command to edit and/or move a card.
#[derive(Debug, Clone)]
pub struct UpdateCard {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The card to update.
    pub card_id: Uuid,
    /// New title, if changing.
    pub title: Option<String>,
    /// New description, if changing. An empty string clears it.
    pub description: Option<String>,
    /// Destination list, if moving.
    pub list_id: Option<Uuid>,
    /// New position, if changing.
    pub position: Option<i32>,
}

/// Command to delete a card.
#[derive(Debug, Clone)]
pub struct DeleteCard {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The card to delete.
    pub card_id: Uuid,
}

/// Command to grant a user access to a board.
#[derive(Debug, Clone)]
pub struct AddMember {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The board to grant access to.
    pub board_id: Uuid,
    /// The user receiving access.
    pub user_id: Uuid,
}

/// Command to revoke a membership.
#[derive(Debug, Clone)]
pub struct RemoveMember {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The membership to revoke.
    pub membership_id: Uuid,
}

command!(CreateBoard, "boards.create_board");
command!(UpdateBoard, "boards.update_board");
command!(DeleteBoard, "boards.delete_board");
command!(CreateList, "boards.create_list");
command!(UpdateList, "boards.update_list");
command!(DeleteList, "boards.delete_list");
command!(CreateCard, "boards.create_card");
command!(UpdateCard, "boards.update_card");
command!(DeleteCard, "boards.delete_card");
command!(AddMember, "boards.add_member");
command!(RemoveMember, "boards.remove_member");
