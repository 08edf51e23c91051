//! Conduit Engine - proxy engine process supervision.

pub mod error;
pub mod supervisor;

pub use error::{EngineError, Result};
pub use supervisor::{EngineHandle, EngineSupervisor, LogSink, LogStream};
