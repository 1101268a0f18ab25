//! Domain layer: entities, domain events and commands.

pub mod commands;
pub mod entities;
pub mod events;
