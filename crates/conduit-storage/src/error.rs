//! Storage error types.

use thiserror::Error;

/// Errors that can occur in history persistence.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error (reading or rewriting the history file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
