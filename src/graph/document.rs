//! GraphDocument: the portable `{nodes, edges}` form of a graph

use super::edge::Edge;
use super::engine::InfraResult;
use super::invariants::{graph_invariant_violations, InvariantViolation};
use super::node::Node;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Exported graph: every node and every edge, nothing else
///
/// This is the JSON shape written by export and accepted by import.
/// Runtime-only state (selection, statuses, search) is never part of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphDocument {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn from_json(json: &str) -> InfraResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> InfraResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a document from a JSON file
    pub fn read_from(path: impl AsRef<Path>) -> InfraResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write the document as pretty JSON, creating parent directories
    pub fn write_to(&self, path: impl AsRef<Path>) -> InfraResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut json = self.to_json_pretty()?;
        json.push('\n');
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn violations(&self) -> Vec<InvariantViolation> {
        graph_invariant_violations(&self.nodes, &self.edges)
    }
}
