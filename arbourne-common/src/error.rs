//! Common error types for the Arbourne backend

use thiserror::Error;

/// Common result type for Arbourne operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared across the service
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Conflicting state (duplicate vote, closed album)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream provider error (MusicBrainz, Cover Art Archive)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the underlying sqlx error is a UNIQUE constraint violation.
    ///
    /// Used as the final backstop for the one-vote-per-voter invariant:
    /// two racing votes both pass the upfront existence check, but only one
    /// insert survives the unique index.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => {
                db_err.message().contains("UNIQUE constraint failed")
            }
            _ => false,
        }
    }
}
