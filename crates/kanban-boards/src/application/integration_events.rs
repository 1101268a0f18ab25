//! Integration events published by the boards context.
//!
//! Every type here is named `<Entity><Operation>IntegrationEvent`, and that
//! name is what the outbox stores to rebuild the event later.

use chrono::{DateTime, Utc};
use kanban_core::event::{IntegrationEvent, IntegrationEventType, IntegrationEventTypes};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! integration_event {
    ($name:ident) => {
        impl IntegrationEvent for $name {
            fn event_id(&self) -> Uuid {
                self.id
            }

            fn occurred_on(&self) -> DateTime<Utc> {
                self.occurred_on
            }

            fn event_type(&self) -> &'static str {
                <Self as IntegrationEventType>::EVENT_TYPE
            }

            fn to_payload(&self) -> Result<String, serde_json::Error> {
                serde_json::to_string(self)
            }
        }

        impl IntegrationEventType for $name {
            const EVENT_TYPE: &'static str = stringify!($name);
        }
    };
}

/// Published when a board is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCreatedIntegrationEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event was produced.
    pub occurred_on: DateTime<Utc>,
    /// The board identifier.
    pub board_id: Uuid,
    /// The owning tenant.
    pub tenant_id: Uuid,
    /// The board name.
    pub name: String,
}

/// Published when a board is renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardUpdatedIntegrationEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event was produced.
    pub occurred_on: DateTime<Utc>,
    /// The board identifier.
    pub board_id: Uuid,
    /// The owning tenant.
    pub tenant_id: Uuid,
    /// The new board name.
    pub name: String,
}

/// Published when a board is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDeletedIntegrationEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event was produced.
    pub occurred_on: DateTime<Utc>,
    /// The board identifier.
    pub board_id: Uuid,
    /// The owning tenant.
    pub tenant_id: Uuid,
}

/// Published when a list is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCreatedIntegrationEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event was produced.
    pub occurred_on: DateTime<Utc>,
    /// The list identifier.
    pub list_id: Uuid,
    /// The board the list belongs to.
    pub board_id: Uuid,
    /// The list name.
    pub name: String,
    /// Position on the board.
    pub position: i32,
}

/// Published when a list is renamed or moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUpdatedIntegrationEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event was produced.
    pub occurred_on: DateTime<Utc>,
    /// The list identifier.
    pub list_id: Uuid,
    /// The board the list belongs to.
    pub board_id: Uuid,
    /// The list name.
    pub name: String,
    /// Position on the board.
    pub position: i32,
}

/// Published when a list is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDeletedIntegrationEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event was produced.
    pub occurred_on: DateTime<Utc>,
    /// The list identifier.
    pub list_id: Uuid,
    /// The board the list belonged to.
    pub board_id: Uuid,
}

/// Published when a card is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardCreatedIntegrationEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event was produced.
    pub occurred_on: DateTime<Utc>,
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
}

/// Published when a card is edited or moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardUpdatedIntegrationEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event was produced.
    pub occurred_on: DateTime<Utc>,
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
}

/// Published when a card is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDeletedIntegrationEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event was produced.
    pub occurred_on: DateTime<Utc>,
    /// The card identifier.
    pub card_id: Uuid,
    /// The list that held the card.
    pub list_id: Uuid,
    /// The board that held the list.
    pub board_id: Uuid,
}

integration_event!(BoardCreatedIntegrationEvent);
integration_event!(BoardUpdatedIntegrationEvent);
integration_event!(BoardDeletedIntegrationEvent);
integration_event!(ListCreatedIntegrationEvent);
integration_event!(ListUpdatedIntegrationEvent);
integration_event!(ListDeletedIntegrationEvent);
integration_event!(CardCreatedIntegrationEvent);
integration_event!(CardUpdatedIntegrationEvent);
integration_event!(CardDeletedIntegrationEvent);

/// Registry of every integration event type this context publishes, used by
/// the dispatcher to rebuild stored records.
#[must_use]
pub fn integration_event_types() -> IntegrationEventTypes {
    IntegrationEventTypes::new()
        .with::<BoardCreatedIntegrationEvent>()
        .with::<BoardUpdatedIntegrationEvent>()
        .with::<BoardDeletedIntegrationEvent>()
        .with::<ListCreatedIntegrationEvent>()
        .with::<ListUpdatedIntegrationEvent>()
        .with::<ListDeletedIntegrationEvent>()
        .with::<CardCreatedIntegrationEvent>()
        .with::<CardUpdatedIntegrationEvent>()
        .with::<CardDeletedIntegrationEvent>()
}
