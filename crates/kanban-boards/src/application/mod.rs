//! Application layer: handlers, translation and storage contracts.

pub mod command_handlers;
pub mod integration_events;
pub mod query_handlers;
pub mod registry;
pub mod service;
pub mod translator;
pub mod unit_of_work;
