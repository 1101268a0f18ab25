//! In-memory storage backend.
//!
//! A session copies the tables on `begin` and applies staged changes to the
//! copy on `flush`, keeping a log of every applied change. `commit` replays
//! that log onto the live tables under the lock, so writes committed by other
//! sessions in the meantime survive. Rollback drops the copy and the log.
//! The store doubles as the dispatcher's outbox repository so a whole
//! enqueue/dispatch round trip can run without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use kanban_core::clock::Clock;
use kanban_core::error::DomainError;
use kanban_core::event::IntegrationEvent;
use kanban_core::outbox::{OutboxRecord, OutboxRepository, OutboxStore};
use kanban_core::pipeline::UnitOfWork;
use tracing::debug;
use uuid::Uuid;

use crate::application::service::SessionFactory;
use crate::application::unit_of_work::{BoardReader, BoardUnitOfWork, PendingChange};
use crate::domain::entities::{Board, BoardList, Card, Membership};
use crate::domain::events::KanbanDomainEvent;

#[derive(Debug, Clone, Default)]
struct Tables {
    boards: HashMap<Uuid, Board>,
    lists: HashMap<Uuid, BoardList>,
    cards: HashMap<Uuid, Card>,
    memberships: HashMap<Uuid, Membership>,
    outbox: Vec<OutboxRecord>,
}

fn missing_parent(entity: &str, parent: &str, id: Uuid) -> DomainError {
    DomainError::Infrastructure(format!("{entity} references missing {parent} {id}"))
}

impl Tables {
    fn apply(&mut self, change: PendingChange) -> Result<(), DomainError> {
        match change {
            PendingChange::SaveBoard(board) => {
                self.boards.insert(board.id, board);
            }
            PendingChange::DeleteBoard(id) => {
                self.boards.remove(&id);
                self.lists.retain(|_, l| l.board_id != id);
                self.cards.retain(|_, c| c.board_id() != id);
                self.memberships.retain(|_, m| m.board_id != id);
            }
            PendingChange::SaveList(list) => {
                if !self.boards.contains_key(&list.board_id) {
                    return Err(missing_parent("list", "board", list.board_id));
                }
                self.lists.insert(list.id, list);
            }
            PendingChange::DeleteList(id) => {
                self.lists.remove(&id);
                self.cards.retain(|_, c| c.list_id() != id);
            }
            PendingChange::SaveCard(card) => {
                if !self.lists.contains_key(&card.list_id()) {
                    return Err(missing_parent("card", "list", card.list_id()));
                }
                self.cards.insert(card.id, card);
            }
            PendingChange::DeleteCard(id) => {
                self.cards.remove(&id);
            }
            PendingChange::SaveMembership(membership) => {
                if !self.boards.contains_key(&membership.board_id) {
                    return Err(missing_parent("membership", "board", membership.board_id));
                }
                self.memberships.insert(membership.id, membership);
            }
            PendingChange::DeleteMembership(id) => {
                self.memberships.remove(&id);
            }
            PendingChange::InsertOutbox(record) => self.outbox.push(record),
        }
        Ok(())
    }
}

/// Shared in-memory tables for boards, lists, cards, memberships and the
/// outbox.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBoardStore {
    tables: Arc<Mutex<Tables>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryBoardStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a tracked session stamping outbox records with `clock`.
    #[must_use]
    pub fn session(&self, clock: Arc<dyn Clock>) -> InMemoryBoardSession {
        InMemoryBoardSession {
            store: self.clone(),
            clock,
            working: None,
            flushed: Vec::new(),
            pending: Vec::new(),
            domain_events: Vec::new(),
        }
    }

    /// Makes the next commit fail, after which commits succeed again.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// All outbox records in insertion order.
    #[must_use]
    pub fn outbox_records(&self) -> Vec<OutboxRecord> {
        self.lock().outbox.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionFactory for InMemoryBoardStore {
    type Session = InMemoryBoardSession;

    fn open_session(&self, clock: Arc<dyn Clock>) -> InMemoryBoardSession {
        self.session(clock)
    }
}

#[async_trait]
impl BoardReader for InMemoryBoardStore {
    async fn board(&self, id: Uuid) -> Result<Option<Board>, DomainError> {
        Ok(self.lock().boards.get(&id).cloned())
    }

    async fn lists_of_board(&self, board_id: Uuid) -> Result<Vec<BoardList>, DomainError> {
        let mut lists: Vec<BoardList> = self
            .lock()
            .lists
            .values()
            .filter(|l| l.board_id == board_id)
            .cloned()
            .collect();
        lists.sort_by_key(|l| (l.position(), l.created_at()));
        Ok(lists)
    }

    async fn cards_of_board(&self, board_id: Uuid) -> Result<Vec<Card>, DomainError> {
        let mut cards: Vec<Card> = self
            .lock()
            .cards
            .values()
            .filter(|c| c.board_id() == board_id)
            .cloned()
            .collect();
        cards.sort_by_key(|c| (c.list_id(), c.position(), c.created_at()));
        Ok(cards)
    }

    async fn members_of_board(&self, board_id: Uuid) -> Result<Vec<Membership>, DomainError> {
        let mut members: Vec<Membership> = self
            .lock()
            .memberships
            .values()
            .filter(|m| m.board_id == board_id)
            .cloned()
            .collect();
        members.sort_by_key(Membership::created_at);
        Ok(members)
    }

    async fn card(&self, id: Uuid) -> Result<Option<Card>, DomainError> {
        Ok(self.lock().cards.get(&id).cloned())
    }
}

#[async_trait]
impl OutboxRepository for InMemoryBoardStore {
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<OutboxRecord>, DomainError> {
        let mut pending: Vec<OutboxRecord> = self
            .lock()
            .outbox
            .iter()
            .filter(|r| r.is_pending())
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.occurred_on);
        pending.truncate(limit);
        Ok(pending)
    }

    async fn save_dispatch_results(&self, records: &[OutboxRecord]) -> Result<(), DomainError> {
        let mut tables = self.lock();
        for updated in records {
            if let Some(existing) = tables.outbox.iter_mut().find(|r| r.id == updated.id) {
                existing.clone_from(updated);
            }
        }
        Ok(())
    }
}

/// A tracked unit of work over an [`InMemoryBoardStore`].
pub struct InMemoryBoardSession {
    store: InMemoryBoardStore,
    clock: Arc<dyn Clock>,
    working: Option<Tables>,
    flushed: Vec<PendingChange>,
    pending: Vec<PendingChange>,
    domain_events: Vec<KanbanDomainEvent>,
}

impl InMemoryBoardSession {
    fn working(&mut self) -> Result<&mut Tables, DomainError> {
        self.working
            .as_mut()
            .ok_or_else(|| DomainError::Infrastructure("no open transaction".into()))
    }
}

#[async_trait]
impl UnitOfWork for InMemoryBoardSession {
    type DomainEvent = KanbanDomainEvent;

    async fn begin(&mut self) -> Result<(), DomainError> {
        if self.working.is_some() {
            return Err(DomainError::Infrastructure(
                "transaction already open".into(),
            ));
        }
        self.working = Some(self.store.lock().clone());
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), DomainError> {
        let changes = std::mem::take(&mut self.pending);
        let working = self.working()?;
        for change in &changes {
            working.apply(change.clone())?;
        }
        self.flushed.extend(changes);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DomainError> {
        if self.store.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(DomainError::Infrastructure("commit failed".into()));
        }
        if self.working.is_none() {
            return Err(DomainError::Infrastructure("no open transaction".into()));
        }
        {
            let mut live = self.store.lock();
            let mut next = live.clone();
            for change in &self.flushed {
                next.apply(change.clone())?;
            }
            *live = next;
        }
        debug!(changes = self.flushed.len(), "in-memory transaction committed");
        self.working = None;
        self.flushed.clear();
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DomainError> {
        self.working = None;
        self.flushed.clear();
        self.pending.clear();
        self.domain_events.clear();
        Ok(())
    }

    fn outbox(&mut self) -> &mut dyn OutboxStore {
        self
    }

    fn take_domain_events(&mut self) -> Vec<KanbanDomainEvent> {
        std::mem::take(&mut self.domain_events)
    }
}

impl OutboxStore for InMemoryBoardSession {
    fn add(&mut self, event: &dyn IntegrationEvent) -> Result<Uuid, DomainError> {
        let record = OutboxRecord::pending(event, self.clock.now())?;
        let id = record.id;
        self.pending.push(PendingChange::InsertOutbox(record));
        Ok(id)
    }
}

#[async_trait]
impl BoardUnitOfWork for InMemoryBoardSession {
    async fn find_board(&mut self, id: Uuid) -> Result<Option<Board>, DomainError> {
        Ok(self.working()?.boards.get(&id).cloned())
    }

    async fn find_list(&mut self, id: Uuid) -> Result<Option<BoardList>, DomainError> {
        Ok(self.working()?.lists.get(&id).cloned())
    }

    async fn find_card(&mut self, id: Uuid) -> Result<Option<Card>, DomainError> {
        Ok(self.working()?.cards.get(&id).cloned())
    }

    async fn find_membership(&mut self, id: Uuid) -> Result<Option<Membership>, DomainError> {
        Ok(self.working()?.memberships.get(&id).cloned())
    }

    fn stage(&mut self, change: PendingChange, mut events: Vec<KanbanDomainEvent>) {
        self.pending.push(change);
        self.domain_events.append(&mut events);
    }
}
