//! Kanban — boards, lists and cards bounded context.
//!
//! Owns the board, list, card and membership entities, the commands that
//! mutate them, and the mapping of their lifecycle events onto the
//! integration events the outbox publishes.

pub mod application;
pub mod domain;
pub mod memory;
