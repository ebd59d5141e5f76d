//! Storage trait definitions

use crate::graph::{GraphId, SavedGraph};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for saved-graph storage backends
///
/// Implementations must be thread-safe (Send + Sync) so a library can be
/// shared across threads.
pub trait GraphRepository: Send + Sync {
    /// Create or update a saved graph
    fn save_graph(&self, graph: &SavedGraph) -> StorageResult<()>;

    /// Load a saved graph by ID
    fn load_graph(&self, id: &GraphId) -> StorageResult<Option<SavedGraph>>;

    /// Delete a saved graph
    fn delete_graph(&self, id: &GraphId) -> StorageResult<bool>;

    /// Load every saved graph
    fn list_graphs(&self) -> StorageResult<Vec<SavedGraph>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: GraphRepository + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
