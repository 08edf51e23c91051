//! Conduit Storage - flat-file link history persistence.

pub mod error;
pub mod store;

pub use error::{Result, StorageError};
pub use store::LinkStore;
