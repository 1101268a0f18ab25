//! Domain to integration event translation.
//!
//! Each integration event gets a fresh id and the clock's current time.
//! Memberships stay internal to the context.

use std::sync::Arc;

use kanban_core::clock::Clock;
use kanban_core::event::IntegrationEvent;
use kanban_core::pipeline::EventTranslator;
use uuid::Uuid;

use super::integration_events::{
    BoardCreatedIntegrationEvent, BoardDeletedIntegrationEvent, BoardUpdatedIntegrationEvent,
    CardCreatedIntegrationEvent, CardDeletedIntegrationEvent, CardUpdatedIntegrationEvent,
    ListCreatedIntegrationEvent, ListDeletedIntegrationEvent, ListUpdatedIntegrationEvent,
};
use crate::domain::events::KanbanDomainEvent;

/// Translates [`KanbanDomainEvent`]s into the context's integration events.
#[derive(Clone)]
pub struct KanbanEventTranslator {
    clock: Arc<dyn Clock>,
}

impl KanbanEventTranslator {
    /// Creates a translator stamping events with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl std::fmt::Debug for KanbanEventTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KanbanEventTranslator").finish_non_exhaustive()
    }
}

impl EventTranslator<KanbanDomainEvent> for KanbanEventTranslator {
    fn translate(&self, event: &KanbanDomainEvent) -> Option<Box<dyn IntegrationEvent>> {
        let id = Uuid::new_v4();
        let occurred_on = self.clock.now();

        let translated: Box<dyn IntegrationEvent> = match event {
            KanbanDomainEvent::BoardCreated(s) => Box::new(BoardCreatedIntegrationEvent {
                id,
                occurred_on,
                board_id: s.board_id,
                tenant_id: s.tenant_id,
                name: s.name.clone(),
            }),
            KanbanDomainEvent::BoardUpdated(s) => Box::new(BoardUpdatedIntegrationEvent {
                id,
                occurred_on,
                board_id: s.board_id,
                tenant_id: s.tenant_id,
                name: s.name.clone(),
            }),
            KanbanDomainEvent::BoardDeleted(s) => Box::new(BoardDeletedIntegrationEvent {
                id,
                occurred_on,
                board_id: s.board_id,
                tenant_id: s.tenant_id,
            }),
            KanbanDomainEvent::ListCreated(s) => Box::new(ListCreatedIntegrationEvent {
                id,
                occurred_on,
                list_id: s.list_id,
                board_id: s.board_id,
                name: s.name.clone(),
                position: s.position,
            }),
            KanbanDomainEvent::ListUpdated(s) => Box::new(ListUpdatedIntegrationEvent {
                id,
                occurred_on,
                list_id: s.list_id,
                board_id: s.board_id,
                name: s.name.clone(),
                position: s.position,
            }),
            KanbanDomainEvent::ListDeleted(s) => Box::new(ListDeletedIntegrationEvent {
                id,
                occurred_on,
                list_id: s.list_id,
                board_id: s.board_id,
            }),
            KanbanDomainEvent::CardCreated(s) => Box::new(CardCreatedIntegrationEvent {
                id,
                occurred_on,
                card_id: s.card_id,
                list_id: s.list_id,
                board_id: s.board_id,
                title: s.title.clone(),
                description: s.description.clone(),
                position: s.position,
            }),
            KanbanDomainEvent::CardUpdated(s) => Box::new(CardUpdatedIntegrationEvent {
                id,
                occurred_on,
                card_id: s.card_id,
                list_id: s.list_id,
                board_id: s.board_id,
                title: s.title.clone(),
                description: s.description.clone(),
                position: s.position,
            }),
            KanbanDomainEvent::CardDeleted(s) => Box::new(CardDeletedIntegrationEvent {
                id,
                occurred_on,
                card_id: s.card_id,
                list_id: s.list_id,
                board_id: s.board_id,
            }),
            KanbanDomainEvent::MembershipCreated(_) | KanbanDomainEvent::MembershipDeleted(_) => {
                return None;
            }
        };
        Some(translated)
    }
}
