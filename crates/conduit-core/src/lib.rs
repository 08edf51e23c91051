//! Conduit Core - share-link parsing and engine config generation.
//!
//! This crate turns a VLESS share-link into the configuration document
//! the proxy engine consumes. It performs no process management and no
//! persistence; see `conduit-engine` and `conduit-storage` for those.

pub mod config;
pub mod error;
pub mod link;

pub use config::EngineConfig;
pub use error::{CoreError, Result};
pub use link::ShareLink;
