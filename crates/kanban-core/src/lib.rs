//! Kanban Core — shared domain abstractions.
//!
//! This crate defines the traits and types every bounded context depends on:
//! entities and their event recorder, domain and integration events, the
//! outbox record and its store contracts, the event bus contract, and the
//! command pipeline decorators. It contains no infrastructure code.

pub mod bus;
pub mod clock;
pub mod command;
pub mod entity;
pub mod error;
pub mod event;
pub mod outbox;
pub mod pipeline;
pub mod recorder;
