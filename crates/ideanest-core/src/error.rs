//! Error types for ideanest.

use thiserror::Error;
use uuid::Uuid;

use crate::models::TaskStatus;

/// Result type alias using ideanest's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ideanest operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Idea not found
    #[error("Idea not found: {0}")]
    IdeaNotFound(Uuid),

    /// Enrichment task not found
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A task status change that would move the lifecycle backwards or skip a step
    #[error("Invalid task transition: {from} -> {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    /// Task payload could not be interpreted
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
