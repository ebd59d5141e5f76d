//! GraphLibrary: the collection of saved infrastructure graphs

use super::document::GraphDocument;
use super::invariants::InvariantViolation;
use super::saved::{GraphId, GraphSummary, GraphUpdate, SavedGraph};
use crate::storage::{GraphRepository, StorageError};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur in infragraph operations
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Graph not found: {0}")]
    GraphNotFound(GraphId),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Graph breaks invariants: {}", join_violations(.0))]
    InvariantViolations(Vec<InvariantViolation>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_violations(violations: &[InvariantViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for infragraph operations
pub type InfraResult<T> = Result<T, InfraError>;

/// Saved graphs, cached in memory
///
/// With a repository attached every mutation is written through before the
/// cache changes, so a failed write leaves the library as it was.
#[derive(Default)]
pub struct GraphLibrary {
    graphs: DashMap<GraphId, SavedGraph>,
    store: Option<Arc<dyn GraphRepository>>,
}

impl std::fmt::Debug for GraphLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphLibrary")
            .field("graphs", &self.graphs.len())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

impl GraphLibrary {
    /// Create an in-memory library
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a library backed by a repository
    ///
    /// Call [`GraphLibrary::load_all`] to populate the cache from it.
    pub fn with_store(store: Arc<dyn GraphRepository>) -> Self {
        Self {
            graphs: DashMap::new(),
            store: Some(store),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    /// Load every stored graph into the cache, returning how many were loaded
    pub fn load_all(&self) -> InfraResult<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let graphs = store.list_graphs()?;
        let count = graphs.len();
        for graph in graphs {
            self.graphs.insert(graph.id.clone(), graph);
        }
        info!(count, "loaded saved graphs");
        Ok(count)
    }

    /// Save a new graph under `name`
    pub fn create_graph(
        &self,
        name: &str,
        description: Option<String>,
        data: GraphDocument,
    ) -> InfraResult<SavedGraph> {
        let name = validate_name(name)?;
        let mut graph = SavedGraph::new(name, data);
        graph.description = normalize_description(description);

        self.persist(&graph)?;
        self.graphs.insert(graph.id.clone(), graph.clone());
        debug!(id = %graph.id, name = %graph.name, "created graph");
        Ok(graph)
    }

    pub fn get_graph(&self, id: &GraphId) -> Option<SavedGraph> {
        self.graphs.get(id).map(|r| r.clone())
    }

    /// First saved graph whose name matches exactly
    pub fn find_by_name(&self, name: &str) -> Option<SavedGraph> {
        let name = name.trim();
        let mut matches: Vec<SavedGraph> = self
            .graphs
            .iter()
            .filter(|r| r.name == name)
            .map(|r| r.clone())
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        matches.into_iter().next()
    }

    /// Summaries of every graph, sorted by name then id
    pub fn list_graphs(&self) -> Vec<GraphSummary> {
        let mut summaries: Vec<GraphSummary> = self.graphs.iter().map(|r| r.summary()).collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    /// Apply a partial update and bump `updated_at`
    pub fn update_graph(&self, id: &GraphId, update: GraphUpdate) -> InfraResult<SavedGraph> {
        let mut graph = self
            .get_graph(id)
            .ok_or_else(|| InfraError::GraphNotFound(id.clone()))?;

        if let Some(name) = update.name {
            graph.name = validate_name(&name)?;
        }
        if let Some(description) = update.description {
            graph.description = normalize_description(description);
        }
        if let Some(data) = update.data {
            graph.data = data;
        }
        graph.updated_at = Utc::now();

        self.persist(&graph)?;
        self.graphs.insert(graph.id.clone(), graph.clone());
        debug!(id = %graph.id, "updated graph");
        Ok(graph)
    }

    /// Remove a graph; `false` if it did not exist
    pub fn delete_graph(&self, id: &GraphId) -> InfraResult<bool> {
        let stored = match &self.store {
            Some(store) => store.delete_graph(id)?,
            None => false,
        };
        let cached = self.graphs.remove(id).is_some();
        if cached || stored {
            debug!(%id, "deleted graph");
        }
        Ok(cached || stored)
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    fn persist(&self, graph: &SavedGraph) -> InfraResult<()> {
        if let Some(store) = &self.store {
            store.save_graph(graph)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> InfraResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(InfraError::InvalidInput("graph name must not be empty".into()));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
