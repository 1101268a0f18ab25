//! Storage seams for the boards context.
//!
//! [`BoardUnitOfWork`] is the tracked, transactional side used by command
//! handlers. [`BoardReader`] is the untracked side used by queries.

use async_trait::async_trait;
use kanban_core::entity::Entity;
use kanban_core::error::DomainError;
use kanban_core::outbox::OutboxRecord;
use kanban_core::pipeline::UnitOfWork;
use uuid::Uuid;

use crate::domain::entities::{Board, BoardList, Card, Membership};
use crate::domain::events::KanbanDomainEvent;

/// A write staged in a unit of work, applied in staging order on flush.
#[derive(Debug, Clone)]
pub enum PendingChange {
    /// Insert or update a board.
    SaveBoard(Board),
    /// Delete a board along with its lists, cards and memberships.
    DeleteBoard(Uuid),
    /// Insert or update a list.
    SaveList(BoardList),
    /// Delete a list along with its cards.
    DeleteList(Uuid),
    /// Insert or update a card.
    SaveCard(Card),
    /// Delete a card.
    DeleteCard(Uuid),
    /// Insert a membership.
    SaveMembership(Membership),
    /// Delete a membership.
    DeleteMembership(Uuid),
    /// Insert an outbox record.
    InsertOutbox(OutboxRecord),
}

/// Tracked unit of work over boards, lists, cards and memberships.
///
/// Lookups see the state of the open transaction. `save_*` and `delete_*`
/// stage the write and collect whatever the entity recorded, so handlers
/// must mark the entity before staging it.
#[async_trait]
pub trait BoardUnitOfWork: UnitOfWork<DomainEvent = KanbanDomainEvent> {
    /// Loads a board.
    async fn find_board(&mut self, id: Uuid) -> Result<Option<Board>, DomainError>;

    /// Loads a list.
    async fn find_list(&mut self, id: Uuid) -> Result<Option<BoardList>, DomainError>;

    /// Loads a card.
    async fn find_card(&mut self, id: Uuid) -> Result<Option<Card>, DomainError>;

    /// Loads a membership.
    async fn find_membership(&mut self, id: Uuid) -> Result<Option<Membership>, DomainError>;

    /// Stages `change` together with the domain events its entity recorded.
    fn stage(&mut self, change: PendingChange, events: Vec<KanbanDomainEvent>);

    /// Stages an insert or update of `board`.
    fn save_board(&mut self, board: &mut Board) {
        let events = board.recorded_events_mut().take();
        self.stage(PendingChange::SaveBoard(board.clone()), events);
    }

    /// Stages deletion of `board`.
    fn delete_board(&mut self, board: &mut Board) {
        let events = board.recorded_events_mut().take();
        self.stage(PendingChange::DeleteBoard(board.id), events);
    }

    /// Stages an insert or update of `list`.
    fn save_list(&mut self, list: &mut BoardList) {
        let events = list.recorded_events_mut().take();
        self.stage(PendingChange::SaveList(list.clone()), events);
    }

    /// Stages deletion of `list`.
    fn delete_list(&mut self, list: &mut BoardList) {
        let events = list.recorded_events_mut().take();
        self.stage(PendingChange::DeleteList(list.id), events);
    }

    /// Stages an insert or update of `card`.
    fn save_card(&mut self, card: &mut Card) {
        let events = card.recorded_events_mut().take();
        self.stage(PendingChange::SaveCard(card.clone()), events);
    }

    /// Stages deletion of `card`.
    fn delete_card(&mut self, card: &mut Card) {
        let events = card.recorded_events_mut().take();
        self.stage(PendingChange::DeleteCard(card.id), events);
    }

    /// Stages an insert of `membership`.
    fn save_membership(&mut self, membership: &mut Membership) {
        let events = membership.recorded_events_mut().take();
        self.stage(PendingChange::SaveMembership(membership.clone()), events);
    }

    /// Stages deletion of `membership`.
    fn delete_membership(&mut self, membership: &mut Membership) {
        let events = membership.recorded_events_mut().take();
        self.stage(PendingChange::DeleteMembership(membership.id), events);
    }
}

/// Untracked reads for queries. Nothing returned here is staged or
/// recorded.
#[async_trait]
pub trait BoardReader: Send + Sync {
    /// Loads a board.
    async fn board(&self, id: Uuid) -> Result<Option<Board>, DomainError>;

    /// Lists of a board, ordered by position.
    async fn lists_of_board(&self, board_id: Uuid) -> Result<Vec<BoardList>, DomainError>;

    /// Cards of a board, ordered by list then position.
    async fn cards_of_board(&self, board_id: Uuid) -> Result<Vec<Card>, DomainError>;

    /// Memberships of a board.
    async fn members_of_board(&self, board_id: Uuid) -> Result<Vec<Membership>, DomainError>;

    /// Loads a card.
    async fn card(&self, id: Uuid) -> Result<Option<Card>, DomainError>;
}
