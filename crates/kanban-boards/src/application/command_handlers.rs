//! Command handlers for the boards context.
//!
//! Handlers load, mutate, mark and stage. They never touch the outbox or the
//! transaction; wrap them with [`kanban_pipeline`] for that.

use std::sync::Arc;

use async_trait::async_trait;
use kanban_core::clock::Clock;
use kanban_core::error::DomainError;
use kanban_core::pipeline::{CommandHandler, Pipeline, TranslatingEventFactory, pipeline};
use kanban_core::recorder::{EventRecorder, RecordLifecycle};
use uuid::Uuid;

use super::translator::KanbanEventTranslator;
use super::unit_of_work::BoardUnitOfWork;
use crate::domain::commands::{
    AddMember, CreateBoard, CreateCard, CreateList, DeleteBoard, DeleteCard, DeleteList,
    RemoveMember, UpdateBoard, UpdateCard, UpdateList,
};
use crate::domain::entities::{Board, BoardList, Card, Membership};
use crate::domain::events::KanbanDomainEvent;

/// The boards context's handler chain: transaction, outbox, business logic.
pub type KanbanPipeline =
    Pipeline<KanbanCommandHandler, TranslatingEventFactory<Arc<KanbanEventTranslator>>>;

/// Builds the full handler chain for the boards context.
#[must_use]
pub fn kanban_pipeline(
    recorder: Arc<EventRecorder<KanbanDomainEvent>>,
    clock: Arc<dyn Clock>,
) -> KanbanPipeline {
    let translator = Arc::new(KanbanEventTranslator::new(Arc::clone(&clock)));
    pipeline(
        KanbanCommandHandler::new(recorder, clock),
        TranslatingEventFactory::new(translator),
    )
}

/// Business handler for every boards command.
#[derive(Clone)]
pub struct KanbanCommandHandler {
    recorder: Arc<EventRecorder<KanbanDomainEvent>>,
    clock: Arc<dyn Clock>,
}

impl KanbanCommandHandler {
    /// Creates a handler.
    #[must_use]
    pub fn new(recorder: Arc<EventRecorder<KanbanDomainEvent>>, clock: Arc<dyn Clock>) -> Self {
        Self { recorder, clock }
    }
}

impl std::fmt::Debug for KanbanCommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KanbanCommandHandler")
            .field("recorder", &self.recorder)
            .finish_non_exhaustive()
    }
}

async fn load_board<U: BoardUnitOfWork>(uow: &mut U, id: Uuid) -> Result<Board, DomainError> {
    uow.find_board(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Board", id))
}

async fn load_list<U: BoardUnitOfWork>(uow: &mut U, id: Uuid) -> Result<BoardList, DomainError> {
    uow.find_list(id)
        .await?
        .ok_or_else(|| DomainError::not_found("List", id))
}

async fn load_card<U: BoardUnitOfWork>(uow: &mut U, id: Uuid) -> Result<Card, DomainError> {
    uow.find_card(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Card", id))
}

#[async_trait]
impl<U: BoardUnitOfWork + 'static> CommandHandler<CreateBoard, U> for KanbanCommandHandler {
    type Output = Board;

    async fn handle(&self, command: &CreateBoard, uow: &mut U) -> Result<Board, DomainError> {
        let mut board = Board::create(command.tenant_id, &command.name, self.clock.as_ref())?;
        board.mark_created(&self.recorder);
        uow.save_board(&mut board);
        Ok(board)
    }
}

#[async_trait]
impl<U: BoardUnitOfWork + 'static> CommandHandler<UpdateBoard, U> for KanbanCommandHandler {
    type Output = Board;

    async fn handle(&self, command: &UpdateBoard, uow: &mut U) -> Result<Board, DomainError> {
        let mut board = load_board(uow, command.board_id).await?;
        board.rename(&command.name, self.clock.as_ref())?;
        board.mark_updated(&self.recorder);
        uow.save_board(&mut board);
        Ok(board)
    }
}

#[async_trait]
impl<U: BoardUnitOfWork + 'static> CommandHandler<DeleteBoard, U> for KanbanCommandHandler {
    type Output = ();

    async fn handle(&self, command: &DeleteBoard, uow: &mut U) -> Result<(), DomainError> {
        let mut board = load_board(uow, command.board_id).await?;
        board.mark_deleted(&self.recorder);
        uow.delete_board(&mut board);
        Ok(())
    }
}

#[async_trait]
impl<U: BoardUnitOfWork + 'static> CommandHandler<CreateList, U> for KanbanCommandHandler {
    type Output = BoardList;

    async fn handle(&self, command: &CreateList, uow: &mut U) -> Result<BoardList, DomainError> {
        let board = load_board(uow, command.board_id).await?;
        let mut list =
            BoardList::create(&board, &command.name, command.position, self.clock.as_ref())?;
        list.mark_created(&self.recorder);
        uow.save_list(&mut list);
        Ok(list)
    }
}

#[async_trait]
impl<U: BoardUnitOfWork + 'static> CommandHandler<UpdateList, U> for KanbanCommandHandler {
    type Output = BoardList;

    async fn handle(&self, command: &UpdateList, uow: &mut U) -> Result<BoardList, DomainError> {
        if command.name.is_none() && command.position.is_none() {
            return Err(DomainError::Validation(
                "update must change the name or the position".into(),
            ));
        }
        let mut list = load_list(uow, command.list_id).await?;
        if let Some(name) = &command.name {
            list.rename(name, self.clock.as_ref())?;
            list.mark_updated(&self.recorder);
        }
        if let Some(position) = command.position {
            list.reposition(position, self.clock.as_ref())?;
            list.mark_updated(&self.recorder);
        }
        uow.save_list(&mut list);
        Ok(list)
    }
}

#[async_trait]
impl<U: BoardUnitOfWork + 'static> CommandHandler<DeleteList, U> for KanbanCommandHandler {
    type Output = ();

    async fn handle(&self, command: &DeleteList, uow: &mut U) -> Result<(), DomainError> {
        let mut list = load_list(uow, command.list_id).await?;
        list.mark_deleted(&self.recorder);
        uow.delete_list(&mut list);
        Ok(())
    }
}

#[async_trait]
impl<U: BoardUnitOfWork + 'static> CommandHandler<CreateCard, U> for KanbanCommandHandler {
    type Output = Card;

    async fn handle(&self, command: &CreateCard, uow: &mut U) -> Result<Card, DomainError> {
        let list = load_list(uow, command.list_id).await?;
        let mut card = Card::create(
            &list,
            &command.title,
            command.description.as_deref(),
            command.position,
            self.clock.as_ref(),
        )?;
        card.mark_created(&self.recorder);
        uow.save_card(&mut card);
        Ok(card)
    }
}

#[async_trait]
impl<U: BoardUnitOfWork + 'static> CommandHandler<UpdateCard, U> for KanbanCommandHandler {
    type Output = Card;

    async fn handle(&self, command: &UpdateCard, uow: &mut U) -> Result<Card, DomainError> {
        if command.title.is_none()
            && command.description.is_none()
            && command.list_id.is_none()
            && command.position.is_none()
        {
            return Err(DomainError::Validation(
                "update must change at least one card field".into(),
            ));
        }
        let mut card = load_card(uow, command.card_id).await?;

        if command.title.is_some() || command.description.is_some() {
            let title = command.title.clone().unwrap_or_else(|| card.title().to_owned());
            let description = match &command.description {
                Some(text) => Some(text.clone()),
                None => card.description().map(str::to_owned),
            };
            card.edit(&title, description.as_deref(), self.clock.as_ref())?;
            card.mark_updated(&self.recorder);
        }

        if command.list_id.is_some() || command.position.is_some() {
            let target_id = command.list_id.unwrap_or_else(|| card.list_id());
            let target = load_list(uow, target_id).await?;
            let position = command.position.unwrap_or_else(|| card.position());
            card.move_to(&target, position, self.clock.as_ref())?;
            card.mark_updated(&self.recorder);
        }

        uow.save_card(&mut card);
        Ok(card)
    }
}

#[async_trait]
impl<U: BoardUnitOfWork + 'static> CommandHandler<DeleteCard, U> for KanbanCommandHandler {
    type Output = ();

    async fn handle(&self, command: &DeleteCard, uow: &mut U) -> Result<(), DomainError> {
        let mut card = load_card(uow, command.card_id).await?;
        card.mark_deleted(&self.recorder);
        uow.delete_card(&mut card);
        Ok(())
    }
}

#[async_trait]
impl<U: BoardUnitOfWork + 'static> CommandHandler<AddMember, U> for KanbanCommandHandler {
    type Output = Membership;

    async fn handle(&self, command: &AddMember, uow: &mut U) -> Result<Membership, DomainError> {
        let board = load_board(uow, command.board_id).await?;
        let mut membership = Membership::create(&board, command.user_id, self.clock.as_ref());
        membership.mark_created(&self.recorder);
        uow.save_membership(&mut membership);
        Ok(membership)
    }
}

#[async_trait]
impl<U: BoardUnitOfWork + 'static> CommandHandler<RemoveMember, U> for KanbanCommandHandler {
    type Output = ();

    async fn handle(&self, command: &RemoveMember, uow: &mut U) -> Result<(), DomainError> {
        let mut membership = uow
            .find_membership(command.membership_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Membership", command.membership_id))?;
        membership.mark_deleted(&self.recorder);
        uow.delete_membership(&mut membership);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use kanban_core::pipeline::UnitOfWork;
    use kanban_test_support::FixedClock;

    use crate::application::registry::event_recorder;
    use crate::memory::{InMemoryBoardSession, InMemoryBoardStore};

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()))
    }

    fn handler() -> KanbanCommandHandler {
        KanbanCommandHandler::new(Arc::new(event_recorder()), clock())
    }

    async fn open_session(store: &InMemoryBoardStore) -> InMemoryBoardSession {
        let mut session = store.session(clock());
        session.begin().await.unwrap();
        session
    }

    async fn seed_list(store: &InMemoryBoardStore) -> (Board, BoardList) {
        let mut session = open_session(store).await;
        let mut board = Board::create(Uuid::new_v4(), "Roadmap", clock().as_ref()).unwrap();
        let mut list = BoardList::create(&board, "Todo", 0, clock().as_ref()).unwrap();
        session.save_board(&mut board);
        session.save_list(&mut list);
        session.flush().await.unwrap();
        session.commit().await.unwrap();
        (board, list)
    }

    #[tokio::test]
    async fn test_create_card_stages_card_and_created_event() {
        // Arrange
        let store = InMemoryBoardStore::new();
        let (_, list) = seed_list(&store).await;
        let mut session = open_session(&store).await;
        let command = CreateCard {
            correlation_id: Uuid::new_v4(),
            list_id: list.id,
            title: "Write docs".to_owned(),
            description: None,
            position: 0,
        };

        // Act
        let card = handler().handle(&command, &mut session).await.unwrap();

        // Assert
        let events = session.take_domain_events();
        assert!(matches!(
            events.as_slice(),
            [KanbanDomainEvent::CardCreated(s)] if s.card_id == card.id && s.list_id == list.id
        ));
    }

    #[tokio::test]
    async fn test_create_card_in_missing_list_is_not_found() {
        let store = InMemoryBoardStore::new();
        let mut session = open_session(&store).await;
        let list_id = Uuid::new_v4();
        let command = CreateCard {
            correlation_id: Uuid::new_v4(),
            list_id,
            title: "Write docs".to_owned(),
            description: None,
            position: 0,
        };

        let result = handler().handle(&command, &mut session).await;

        match result {
            Err(DomainError::EntityNotFound { entity, id }) => {
                assert_eq!(entity, "List");
                assert_eq!(id, list_id);
            }
            other => panic!("expected EntityNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_card_edit_and_move_records_one_update() {
        // Arrange
        let store = InMemoryBoardStore::new();
        let (board, todo) = seed_list(&store).await;
        let mut session = open_session(&store).await;
        let mut done = BoardList::create(&board, "Done", 1, clock().as_ref()).unwrap();
        let mut card = Card::create(&todo, "Write docs", None, 0, clock().as_ref()).unwrap();
        session.save_list(&mut done);
        session.save_card(&mut card);
        session.flush().await.unwrap();
        session.commit().await.unwrap();
        let mut session = open_session(&store).await;
        let command = UpdateCard {
            correlation_id: Uuid::new_v4(),
            card_id: card.id,
            title: Some("Write more docs".to_owned()),
            description: None,
            list_id: Some(done.id),
            position: Some(2),
        };

        // Act
        let updated = handler().handle(&command, &mut session).await.unwrap();

        // Assert
        assert_eq!(updated.title(), "Write more docs");
        assert_eq!(updated.list_id(), done.id);
        let events = session.take_domain_events();
        match events.as_slice() {
            [KanbanDomainEvent::CardUpdated(s)] => {
                assert_eq!(s.title, "Write more docs");
                assert_eq!(s.list_id, done.id);
                assert_eq!(s.position, 2);
            }
            other => panic!("expected one CardUpdated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_card_empty_description_clears_it() {
        let store = InMemoryBoardStore::new();
        let (_, list) = seed_list(&store).await;
        let mut session = open_session(&store).await;
        let mut card =
            Card::create(&list, "Write docs", Some("draft"), 0, clock().as_ref()).unwrap();
        session.save_card(&mut card);
        session.flush().await.unwrap();
        session.commit().await.unwrap();
        let mut session = open_session(&store).await;
        let command = UpdateCard {
            correlation_id: Uuid::new_v4(),
            card_id: card.id,
            title: None,
            description: Some(String::new()),
            list_id: None,
            position: None,
        };

        let updated = handler().handle(&command, &mut session).await.unwrap();

        assert_eq!(updated.description(), None);
        assert_eq!(updated.title(), "Write docs");
    }

    #[tokio::test]
    async fn test_update_list_without_changes_is_rejected() {
        let store = InMemoryBoardStore::new();
        let (_, list) = seed_list(&store).await;
        let mut session = open_session(&store).await;
        let command = UpdateList {
            correlation_id: Uuid::new_v4(),
            list_id: list.id,
            name: None,
            position: None,
        };

        let result = handler().handle(&command, &mut session).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_member_records_internal_event() {
        let store = InMemoryBoardStore::new();
        let (board, _) = seed_list(&store).await;
        let mut session = open_session(&store).await;
        let user_id = Uuid::new_v4();
        let command = AddMember {
            correlation_id: Uuid::new_v4(),
            board_id: board.id,
            user_id,
        };

        let membership = handler().handle(&command, &mut session).await.unwrap();

        assert_eq!(membership.user_id, user_id);
        assert!(matches!(
            session.take_domain_events().as_slice(),
            [KanbanDomainEvent::MembershipCreated(_)]
        ));
    }

    #[tokio::test]
    async fn test_delete_board_records_deleted_event() {
        let store = InMemoryBoardStore::new();
        let (board, _) = seed_list(&store).await;
        let mut session = open_session(&store).await;
        let command = DeleteBoard {
            correlation_id: Uuid::new_v4(),
            board_id: board.id,
        };

        handler().handle(&command, &mut session).await.unwrap();

        assert!(matches!(
            session.take_domain_events().as_slice(),
            [KanbanDomainEvent::BoardDeleted(s)] if s.board_id == board.id
        ));
    }
}
