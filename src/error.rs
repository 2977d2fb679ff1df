//! Error types for floatchat.

use std::io;
use thiserror::Error;

/// Result type alias for floatchat operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in floatchat operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage I/O error.
    #[error("Storage error: {0}")]
    Storage(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// A generated session id collided with an existing one.
    #[error("Duplicate session id: {0}")]
    DuplicateSession(String),

    /// Refused to delete the only remaining session.
    #[error("Cannot delete the last chat.")]
    LastSession,

    /// A request is already outstanding for this session.
    #[error("A question is already being answered in session {0}")]
    RequestInFlight(String),

    /// HTTP client construction error.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
