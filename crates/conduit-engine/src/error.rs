//! Engine supervision error types.

use thiserror::Error;

/// Errors that can occur while supervising the engine process.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine binary could not be started.
    #[error("Failed to start engine: {0}")]
    Spawn(std::io::Error),

    /// A captured output pipe was unexpectedly absent.
    #[error("Engine {0} pipe unavailable")]
    Pipe(&'static str),

    /// Waiting on the engine process failed.
    #[error("Failed to wait on engine: {0}")]
    Wait(std::io::Error),

    /// The supervision task was cancelled or panicked.
    #[error("Engine supervision task failed")]
    TaskJoin,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
