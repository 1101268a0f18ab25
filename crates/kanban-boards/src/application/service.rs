//! Application service: one fresh unit of work per command, run through the
//! full pipeline.
//!
//! [`BoardCommands`] is object safe so the HTTP layer can hold any backend
//! behind an `Arc<dyn BoardCommands>`.

use std::sync::Arc;

use async_trait::async_trait;
use kanban_core::clock::Clock;
use kanban_core::command::Command;
use kanban_core::error::DomainError;
use kanban_core::pipeline::CommandHandler;
use kanban_core::recorder::EventRecorder;
use tracing::debug;

use super::command_handlers::{KanbanPipeline, kanban_pipeline};
use super::unit_of_work::BoardUnitOfWork;
use crate::domain::commands::{
    AddMember, CreateBoard, CreateCard, CreateList, DeleteBoard, DeleteCard, DeleteList,
    RemoveMember, UpdateBoard, UpdateCard, UpdateList,
};
use crate::domain::entities::{Board, BoardList, Card, Membership};
use crate::domain::events::KanbanDomainEvent;

/// Opens tracked units of work.
pub trait SessionFactory: Send + Sync {
    /// The unit of work type produced.
    type Session: BoardUnitOfWork + 'static;

    /// Opens a new, not yet begun, unit of work.
    fn open_session(&self, clock: Arc<dyn Clock>) -> Self::Session;
}

/// Every command the boards context accepts.
#[async_trait]
pub trait BoardCommands: Send + Sync {
    /// Creates a board.
    async fn create_board(&self, command: CreateBoard) -> Result<Board, DomainError>;
    /// Renames a board.
    async fn update_board(&self, command: UpdateBoard) -> Result<Board, DomainError>;
    /// Deletes a board.
    async fn delete_board(&self, command: DeleteBoard) -> Result<(), DomainError>;
    /// Creates a list.
    async fn create_list(&self, command: CreateList) -> Result<BoardList, DomainError>;
    /// Renames or moves a list.
    async fn update_list(&self, command: UpdateList) -> Result<BoardList, DomainError>;
    /// Deletes a list.
    async fn delete_list(&self, command: DeleteList) -> Result<(), DomainError>;
    /// Creates a card.
    async fn create_card(&self, command: CreateCard) -> Result<Card, DomainError>;
    /// Edits or moves a card.
    async fn update_card(&self, command: UpdateCard) -> Result<Card, DomainError>;
    /// Deletes a card.
    async fn delete_card(&self, command: DeleteCard) -> Result<(), DomainError>;
    /// Adds a board member.
    async fn add_member(&self, command: AddMember) -> Result<Membership, DomainError>;
    /// Removes a board member.
    async fn remove_member(&self, command: RemoveMember) -> Result<(), DomainError>;
}

/// Runs each command through [`KanbanPipeline`] on a fresh session.
pub struct BoardService<S> {
    sessions: S,
    clock: Arc<dyn Clock>,
    chain: KanbanPipeline,
}

impl<S: SessionFactory> BoardService<S> {
    /// Creates a service over `sessions`.
    #[must_use]
    pub fn new(
        sessions: S,
        recorder: Arc<EventRecorder<KanbanDomainEvent>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            chain: kanban_pipeline(recorder, Arc::clone(&clock)),
            clock,
        }
    }

    async fn execute<C>(
        &self,
        command: C,
    ) -> Result<<KanbanPipeline as CommandHandler<C, S::Session>>::Output, DomainError>
    where
        C: Command + 'static,
        KanbanPipeline: CommandHandler<C, S::Session>,
    {
        debug!(
            command_type = command.command_type(),
            correlation_id = %command.correlation_id(),
            "executing command"
        );
        let mut session = self.sessions.open_session(Arc::clone(&self.clock));
        self.chain.handle(&command, &mut session).await
    }
}

#[async_trait]
impl<S: SessionFactory> BoardCommands for BoardService<S> {
    async fn create_board(&self, command: CreateBoard) -> Result<Board, DomainError> {
        self.execute(command).await
    }

    async fn update_board(&self, command: UpdateBoard) -> Result<Board, DomainError> {
        self.execute(command).await
    }

    async fn delete_board(&self, command: DeleteBoard) -> Result<(), DomainError> {
        self.execute(command).await
    }

    async fn create_list(&self, command: CreateList) -> Result<BoardList, DomainError> {
        self.execute(command).await
    }

    async fn update_list(&self, command: UpdateList) -> Result<BoardList, DomainError> {
        self.execute(command).await
    }

    async fn delete_list(&self, command: DeleteList) -> Result<(), DomainError> {
        self.execute(command).await
    }

    async fn create_card(&self, command: CreateCard) -> Result<Card, DomainError> {
        self.execute(command).await
    }

    async fn update_card(&self, command: UpdateCard) -> Result<Card, DomainError> {
        self.execute(command).await
    }

    async fn delete_card(&self, command: DeleteCard) -> Result<(), DomainError> {
        self.execute(command).await
    }

    async fn add_member(&self, command: AddMember) -> Result<Membership, DomainError> {
        self.execute(command).await
    }

    async fn remove_member(&self, command: RemoveMember) -> Result<(), DomainError> {
        self.execute(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use kanban_test_support::FixedClock;
    use uuid::Uuid;

    use crate::application::registry::event_recorder;
    use crate::application::unit_of_work::BoardReader;
    use crate::memory::InMemoryBoardStore;

    fn service(store: &InMemoryBoardStore) -> BoardService<InMemoryBoardStore> {
        BoardService::new(
            store.clone(),
            Arc::new(event_recorder()),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())),
        )
    }

    #[tokio::test]
    async fn test_each_command_commits_on_its_own_session() {
        // Arrange
        let store = InMemoryBoardStore::new();
        let service = service(&store);

        // Act
        let board = service
            .create_board(CreateBoard {
                correlation_id: Uuid::new_v4(),
                tenant_id: Uuid::new_v4(),
                name: "Roadmap".to_owned(),
            })
            .await
            .unwrap();
        service
            .update_board(UpdateBoard {
                correlation_id: Uuid::new_v4(),
                board_id: board.id,
                name: "Roadmap 2026".to_owned(),
            })
            .await
            .unwrap();

        // Assert
        let stored = store.board(board.id).await.unwrap().unwrap();
        assert_eq!(stored.name(), "Roadmap 2026");
        let types: Vec<String> = store
            .outbox_records()
            .into_iter()
            .map(|r| r.event_type)
            .collect();
        assert_eq!(
            types,
            vec!["BoardCreatedIntegrationEvent", "BoardUpdatedIntegrationEvent"]
        );
    }

    #[tokio::test]
    async fn test_delete_of_missing_board_is_not_found() {
        let store = InMemoryBoardStore::new();

        let result = service(&store)
            .delete_board(DeleteBoard {
                correlation_id: Uuid::new_v4(),
                board_id: Uuid::new_v4(),
            })
            .await;

        assert!(matches!(result, Err(DomainError::EntityNotFound { .. })));
        assert!(store.outbox_records().is_empty());
    }
}
