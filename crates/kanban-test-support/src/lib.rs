//! Shared test mocks and utilities for the Kanban service.

mod bus;
mod clock;
mod outbox;

pub use bus::{FailingEventBus, FlakyEventBus, PublishedEvent, RecordingEventBus};
pub use clock::{FixedClock, ManualClock};
pub use outbox::{FailingOutboxRepository, InMemoryOutboxRepository};
