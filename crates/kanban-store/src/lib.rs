//! Kanban Store — `PostgreSQL` persistence.
//!
//! [`PgBoardSession`](session::PgBoardSession) is the tracked,
//! transactional unit of work used by the command pipeline.
//! [`PgBoardReader`](reader::PgBoardReader) serves untracked reads for
//! queries. [`PgOutboxRepository`](outbox::PgOutboxRepository) is the
//! dispatcher's view of the outbox table.

use kanban_core::error::DomainError;

pub mod outbox;
pub mod reader;
mod rows;
pub mod session;

pub use outbox::PgOutboxRepository;
pub use reader::PgBoardReader;
pub use session::{PgBoardSession, PgSessionFactory};

/// Maps a driver error onto the domain's infrastructure error.
pub(crate) fn db_error(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {err}"))
}
