//! Event recorder registrations for the boards context.

use kanban_core::entity::Operation;
use kanban_core::recorder::EventRecorder;

use crate::domain::entities::{Board, BoardList, Card, Membership};
use crate::domain::events::KanbanDomainEvent;

/// Builds the recorder with a constructor for every lifecycle event the
/// boards context emits. Memberships are never updated, so no
/// `MembershipUpdated` constructor exists.
#[must_use]
pub fn event_recorder() -> EventRecorder<KanbanDomainEvent> {
    EventRecorder::builder()
        .on::<Board>(Operation::Created, |b| KanbanDomainEvent::BoardCreated(b.snapshot()))
        .on::<Board>(Operation::Updated, |b| KanbanDomainEvent::BoardUpdated(b.snapshot()))
        .on::<Board>(Operation::Deleted, |b| KanbanDomainEvent::BoardDeleted(b.snapshot()))
        .on::<BoardList>(Operation::Created, |l| KanbanDomainEvent::ListCreated(l.snapshot()))
        .on::<BoardList>(Operation::Updated, |l| KanbanDomainEvent::ListUpdated(l.snapshot()))
        .on::<BoardList>(Operation::Deleted, |l| KanbanDomainEvent::ListDeleted(l.snapshot()))
        .on::<Card>(Operation::Created, |c| KanbanDomainEvent::CardCreated(c.snapshot()))
        .on::<Card>(Operation::Updated, |c| KanbanDomainEvent::CardUpdated(c.snapshot()))
        .on::<Card>(Operation::Deleted, |c| KanbanDomainEvent::CardDeleted(c.snapshot()))
        .on::<Membership>(Operation::Created, |m| {
            KanbanDomainEvent::MembershipCreated(m.snapshot())
        })
        .on::<Membership>(Operation::Deleted, |m| {
            KanbanDomainEvent::MembershipDeleted(m.snapshot())
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use kanban_core::entity::Entity;
    use kanban_core::recorder::RecordLifecycle;
    use kanban_test_support::FixedClock;
    use uuid::Uuid;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    #[test]
    fn test_renaming_twice_records_one_event_with_final_name() {
        // Arrange
        let recorder = event_recorder();
        let mut board = Board::create(Uuid::new_v4(), "Roadmap", &clock()).unwrap();

        // Act
        board.rename("Roadmap 2026", &clock()).unwrap();
        board.mark_updated(&recorder);
        board.rename("Roadmap 2027", &clock()).unwrap();
        board.mark_updated(&recorder);

        // Assert
        match board.recorded_events().as_slice() {
            [KanbanDomainEvent::BoardUpdated(snapshot)] => {
                assert_eq!(snapshot.name, "Roadmap 2027");
            }
            other => panic!("expected one BoardUpdated, got {other:?}"),
        }
    }

    #[test]
    fn test_created_and_updated_are_kept_side_by_side() {
        let recorder = event_recorder();
        let board = Board::create(Uuid::new_v4(), "Roadmap", &clock()).unwrap();
        let mut list = BoardList::create(&board, "Todo", 0, &clock()).unwrap();

        list.mark_created(&recorder);
        list.mark_updated(&recorder);

        assert_eq!(list.recorded_events().len(), 2);
    }

    #[test]
    fn test_membership_update_is_silent_no_op() {
        let recorder = event_recorder();
        let board = Board::create(Uuid::new_v4(), "Roadmap", &clock()).unwrap();
        let mut membership = Membership::create(&board, Uuid::new_v4(), &clock());

        let recorded = membership.mark_updated(&recorder);

        assert!(!recorded);
        assert!(membership.recorded_events().is_empty());
        assert!(recorder.supports::<Membership>(Operation::Created));
    }
}
