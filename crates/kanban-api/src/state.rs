//! Shared application state.

use std::sync::Arc;

use kanban_boards::application::service::BoardCommands;
use kanban_boards::application::unit_of_work::BoardReader;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Command side: every mutation runs through the full pipeline.
    pub commands: Arc<dyn BoardCommands>,
    /// Query side: untracked reads.
    pub reader: Arc<dyn BoardReader>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(commands: Arc<dyn BoardCommands>, reader: Arc<dyn BoardReader>) -> Self {
        Self { commands, reader }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
