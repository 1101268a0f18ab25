//! Entities for the boards context.
//!
//! Each entity carries its own list of recorded domain events. Entities do
//! not name the events they produce; handlers call `mark_created`,
//! `mark_updated` or `mark_deleted` and the recorder picks the event.

use chrono::{DateTime, Utc};
use kanban_core::clock::Clock;
use kanban_core::entity::{Entity, RecordedEvents};
use kanban_core::error::DomainError;
use uuid::Uuid;

use super::events::{
    BoardSnapshot, CardSnapshot, KanbanDomainEvent, ListSnapshot, MembershipSnapshot,
};

/// Maximum length of board names, list names and card titles.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of a card description.
pub const MAX_DESCRIPTION_LENGTH: usize = 4000;

fn validate_name(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be blank")));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

fn validate_description(value: Option<&str>) -> Result<Option<String>, DomainError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LENGTH => {
            Err(DomainError::Validation(format!(
                "description must be at most {MAX_DESCRIPTION_LENGTH} characters"
            )))
        }
        Some(text) => Ok(Some(text.to_owned())),
    }
}

fn validate_position(position: i32) -> Result<i32, DomainError> {
    if position < 0 {
        return Err(DomainError::Validation(format!(
            "position must not be negative, got {position}"
        )));
    }
    Ok(position)
}

/// A tenant-owned board.
#[derive(Debug, Clone)]
pub struct Board {
    /// Entity identifier.
    pub id: Uuid,
    /// The owning tenant.
    pub tenant_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: RecordedEvents<KanbanDomainEvent>,
}

impl Board {
    /// Creates a new board.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is blank or too long.
    pub fn create(tenant_id: Uuid, name: &str, clock: &dyn Clock) -> Result<Self, DomainError> {
        let now = clock.now();
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: validate_name("board name", name)?,
            created_at: now,
            updated_at: now,
            events: RecordedEvents::new(),
        })
    }

    /// Rebuilds a board loaded from storage.
    #[must_use]
    pub fn restore(
        id: Uuid,
        tenant_id: Uuid,
        name: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            name,
            created_at,
            updated_at,
            events: RecordedEvents::new(),
        }
    }

    /// Renames the board.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is blank or too long.
    pub fn rename(&mut self, name: &str, clock: &dyn Clock) -> Result<(), DomainError> {
        self.name = validate_name("board name", name)?;
        self.updated_at = clock.now();
        Ok(())
    }

    /// The board name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification time.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            board_id: self.id,
            tenant_id: self.tenant_id,
            name: self.name.clone(),
        }
    }
}

impl Entity for Board {
    type Event = KanbanDomainEvent;
    const KIND: &'static str = "Board";

    fn id(&self) -> Uuid {
        self.id
    }

    fn recorded_events(&self) -> &RecordedEvents<KanbanDomainEvent> {
        &self.events
    }

    fn recorded_events_mut(&mut self) -> &mut RecordedEvents<KanbanDomainEvent> {
        &mut self.events
    }
}

/// A column on a board.
#[derive(Debug, Clone)]
pub struct BoardList {
    /// Entity identifier.
    pub id: Uuid,
    /// The board the list belongs to.
    pub board_id: Uuid,
    name: String,
    position: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: RecordedEvents<KanbanDomainEvent>,
}

impl BoardList {
    /// Creates a new list on `board`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name or position is invalid.
    pub fn create(
        board: &Board,
        name: &str,
        position: i32,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        let now = clock.now();
        Ok(Self {
            id: Uuid::new_v4(),
            board_id: board.id,
            name: validate_name("list name", name)?,
            position: validate_position(position)?,
            created_at: now,
            updated_at: now,
            events: RecordedEvents::new(),
        })
    }

    /// Rebuilds a list loaded from storage.
    #[must_use]
    pub fn restore(
        id: Uuid,
        board_id: Uuid,
        name: String,
        position: i32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            board_id,
            name,
            position,
            created_at,
            updated_at,
            events: RecordedEvents::new(),
        }
    }

    /// Renames the list.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is blank or too long.
    pub fn rename(&mut self, name: &str, clock: &dyn Clock) -> Result<(), DomainError> {
        self.name = validate_name("list name", name)?;
        self.updated_at = clock.now();
        Ok(())
    }

    /// Moves the list to `position` on its board.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the position is negative.
    pub fn reposition(&mut self, position: i32, clock: &dyn Clock) -> Result<(), DomainError> {
        self.position = validate_position(position)?;
        self.updated_at = clock.now();
        Ok(())
    }

    /// The list name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position on the board.
    #[must_use]
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Creation time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification time.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            list_id: self.id,
            board_id: self.board_id,
            name: self.name.clone(),
            position: self.position,
        }
    }
}

impl Entity for BoardList {
    type Event = KanbanDomainEvent;
    const KIND: &'static str = "List";

    fn id(&self) -> Uuid {
        self.id
    }

    fn recorded_events(&self) -> &RecordedEvents<KanbanDomainEvent> {
        &self.events
    }

    fn recorded_events_mut(&mut self) -> &mut RecordedEvents<KanbanDomainEvent> {
        &mut self.events
    }
}

/// A card inside a list.
#[derive(Debug, Clone)]
pub struct Card {
    /// Entity identifier.
    pub id: Uuid,
    list_id: Uuid,
    board_id: Uuid,
    title: String,
    description: Option<String>,
    position: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: RecordedEvents<KanbanDomainEvent>,
}

impl Card {
    /// Creates a new card in `list`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the title, description or
    /// position is invalid.
    pub fn create(
        list: &BoardList,
        title: &str,
        description: Option<&str>,
        position: i32,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        let now = clock.now();
        Ok(Self {
            id: Uuid::new_v4(),
            list_id: list.id,
            board_id: list.board_id,
            title: validate_name("card title", title)?,
            description: validate_description(description)?,
            position: validate_position(position)?,
            created_at: now,
            updated_at: now,
            events: RecordedEvents::new(),
        })
    }

    /// Rebuilds a card loaded from storage.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn restore(
        id: Uuid,
        list_id: Uuid,
        board_id: Uuid,
        title: String,
        description: Option<String>,
        position: i32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            list_id,
            board_id,
            title,
            description,
            position,
            created_at,
            updated_at,
            events: RecordedEvents::new(),
        }
    }

    /// Changes the title and description.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the title or description is
    /// invalid.
    pub fn edit(
        &mut self,
        title: &str,
        description: Option<&str>,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.title = validate_name("card title", title)?;
        self.description = validate_description(description)?;
        self.updated_at = clock.now();
        Ok(())
    }

    /// Moves the card to `position` in `list`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `list` is on another board or the
    /// position is negative.
    pub fn move_to(
        &mut self,
        list: &BoardList,
        position: i32,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if list.board_id != self.board_id {
            return Err(DomainError::Validation(format!(
                "card {} cannot move to list {} on another board",
                self.id, list.id
            )));
        }
        self.position = validate_position(position)?;
        self.list_id = list.id;
        self.updated_at = clock.now();
        Ok(())
    }

    /// The list holding the card.
    #[must_use]
    pub fn list_id(&self) -> Uuid {
        self.list_id
    }

    /// The board holding the card's list.
    #[must_use]
    pub fn board_id(&self) -> Uuid {
        self.board_id
    }

    /// The card title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The card description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Position within the list.
    #[must_use]
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Creation time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification time.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn snapshot(&self) -> CardSnapshot {
        CardSnapshot {
            card_id: self.id,
            list_id: self.list_id,
            board_id: self.board_id,
            title: self.title.clone(),
            description: self.description.clone(),
            position: self.position,
        }
    }
}

impl Entity for Card {
    type Event = KanbanDomainEvent;
    const KIND: &'static str = "Card";

    fn id(&self) -> Uuid {
        self.id
    }

    fn recorded_events(&self) -> &RecordedEvents<KanbanDomainEvent> {
        &self.events
    }

    fn recorded_events_mut(&mut self) -> &mut RecordedEvents<KanbanDomainEvent> {
        &mut self.events
    }
}

/// A user's access to a board.
#[derive(Debug, Clone)]
pub struct Membership {
    /// Entity identifier.
    pub id: Uuid,
    /// The board the user may access.
    pub board_id: Uuid,
    /// The member.
    pub user_id: Uuid,
    created_at: DateTime<Utc>,
    events: RecordedEvents<KanbanDomainEvent>,
}

impl Membership {
    /// Grants `user_id` access to `board`.
    #[must_use]
    pub fn create(board: &Board, user_id: Uuid, clock: &dyn Clock) -> Self {
        Self {
            id: Uuid::new_v4(),
            board_id: board.id,
            user_id,
            created_at: clock.now(),
            events: RecordedEvents::new(),
        }
    }

    /// Rebuilds a membership loaded from storage.
    #[must_use]
    pub fn restore(id: Uuid, board_id: Uuid, user_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            board_id,
            user_id,
            created_at,
            events: RecordedEvents::new(),
        }
    }

    /// Creation time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn snapshot(&self) -> MembershipSnapshot {
        MembershipSnapshot {
            membership_id: self.id,
            board_id: self.board_id,
            user_id: self.user_id,
        }
    }
}

impl Entity for Membership {
    type Event = KanbanDomainEvent;
    const KIND: &'static str = "Membership";

    fn id(&self) -> Uuid {
        self.id
    }

    fn recorded_events(&self) -> &RecordedEvents<KanbanDomainEvent> {
        &self.events
    }

    fn recorded_events_mut(&mut self) -> &mut RecordedEvents<KanbanDomainEvent> {
        &mut self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kanban_test_support::FixedClock;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    #[test]
    fn test_create_board_trims_name() {
        let board = Board::create(Uuid::new_v4(), "  Roadmap  ", &clock()).unwrap();

        assert_eq!(board.name(), "Roadmap");
        assert_eq!(board.created_at(), clock().0);
        assert!(board.recorded_events().is_empty());
    }

    #[test]
    fn test_create_board_rejects_blank_name() {
        let result = Board::create(Uuid::new_v4(), "   ", &clock());

        match result {
            Err(DomainError::Validation(message)) => assert!(message.contains("blank")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_create_list_rejects_negative_position() {
        let board = Board::create(Uuid::new_v4(), "Roadmap", &clock()).unwrap();

        let result = BoardList::create(&board, "Todo", -1, &clock());

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_card_rejects_overlong_title() {
        let board = Board::create(Uuid::new_v4(), "Roadmap", &clock()).unwrap();
        let list = BoardList::create(&board, "Todo", 0, &clock()).unwrap();
        let title = "t".repeat(MAX_NAME_LENGTH + 1);

        let result = Card::create(&list, &title, None, 0, &clock());

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_card_blank_description_is_none() {
        let board = Board::create(Uuid::new_v4(), "Roadmap", &clock()).unwrap();
        let list = BoardList::create(&board, "Todo", 0, &clock()).unwrap();

        let card = Card::create(&list, "Write docs", Some("  "), 0, &clock()).unwrap();

        assert_eq!(card.description(), None);
        assert_eq!(card.list_id(), list.id);
        assert_eq!(card.board_id(), board.id);
    }

    #[test]
    fn test_card_moves_within_board() {
        let board = Board::create(Uuid::new_v4(), "Roadmap", &clock()).unwrap();
        let todo = BoardList::create(&board, "Todo", 0, &clock()).unwrap();
        let done = BoardList::create(&board, "Done", 1, &clock()).unwrap();
        let mut card = Card::create(&todo, "Write docs", None, 0, &clock()).unwrap();

        card.move_to(&done, 3, &clock()).unwrap();

        assert_eq!(card.list_id(), done.id);
        assert_eq!(card.position(), 3);
    }

    #[test]
    fn test_card_cannot_move_to_other_board() {
        let board = Board::create(Uuid::new_v4(), "Roadmap", &clock()).unwrap();
        let other = Board::create(Uuid::new_v4(), "Backlog", &clock()).unwrap();
        let todo = BoardList::create(&board, "Todo", 0, &clock()).unwrap();
        let foreign = BoardList::create(&other, "Todo", 0, &clock()).unwrap();
        let mut card = Card::create(&todo, "Write docs", None, 0, &clock()).unwrap();

        let result = card.move_to(&foreign, 0, &clock());

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(card.list_id(), todo.id);
    }
}
