//! Storage backends for saved graphs
//!
//! Backends implement the `GraphRepository` trait. The primary
//! implementation is `SqliteStore` for persistent storage.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{GraphRepository, OpenStore, StorageError, StorageResult};
