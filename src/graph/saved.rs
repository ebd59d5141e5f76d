//! Saved graphs: named, timestamped graph documents kept in the library

use super::document::GraphDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a saved graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphId(String);

impl GraphId {
    /// Create a new random GraphId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a GraphId from an existing string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GraphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GraphId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for GraphId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A named graph document with creation and update times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGraph {
    pub id: GraphId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data: GraphDocument,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavedGraph {
    /// Create a saved graph stamped with the current time
    pub fn new(name: impl Into<String>, data: GraphDocument) -> Self {
        let now = Utc::now();
        Self {
            id: GraphId::new(),
            name: name.into(),
            description: None,
            data,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            node_count: self.data.nodes.len(),
            edge_count: self.data.edges.len(),
            updated_at: self.updated_at,
        }
    }
}

/// Listing entry for a saved graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    pub id: GraphId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub node_count: usize,
    pub edge_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// Partial update to a saved graph; `None` leaves a field as it is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub data: Option<GraphDocument>,
}

impl GraphUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn data(mut self, data: GraphDocument) -> Self {
        self.data = Some(data);
        self
    }
}
