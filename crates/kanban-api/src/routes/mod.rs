//! Route modules.

pub mod boards;
pub mod cards;
pub mod health;
pub mod lists;
