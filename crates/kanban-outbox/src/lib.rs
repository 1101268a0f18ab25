//! Kanban — outbox dispatcher.
//!
//! Drains pending outbox records on a fixed interval and hands them to an
//! [`EventBus`](kanban_core::bus::EventBus).

pub mod bus;
pub mod dispatcher;
pub mod error;

pub use bus::TracingEventBus;
pub use dispatcher::{DispatchReport, DispatcherConfig, OutboxDispatcher};
pub use error::DispatchError;
