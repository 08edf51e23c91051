//! Core error types.

use thiserror::Error;

/// Errors that can occur while parsing links or writing configs.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The link does not start with a supported scheme.
    #[error("Unsupported link scheme (expected vless://)")]
    UnsupportedScheme,

    /// The link is structurally malformed.
    #[error("Malformed link: {0}")]
    InvalidLink(String),

    /// The link carries a port that is not a valid TCP port.
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    /// A required link field is absent or empty.
    #[error("Missing required link field: {0}")]
    MissingField(&'static str),

    /// IO error (e.g., writing the config file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
