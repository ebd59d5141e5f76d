//! Query types and result structures

use crate::graph::{Edge, Node, NodeId};
use serde::Serialize;

/// Direction for dependency traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Follow dependencies (source -> target)
    #[default]
    Outgoing,
    /// Follow dependents (target <- source)
    Incoming,
    /// Follow edges in both directions
    Both,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outgoing" | "out" => Ok(Direction::Outgoing),
            "incoming" | "in" => Ok(Direction::Incoming),
            "both" => Ok(Direction::Both),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// Result of a find query
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    /// Nodes matching the query
    pub nodes: Vec<Node>,
    /// Total count (may differ from nodes.len() if limit applied)
    pub total_count: usize,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            total_count: 0,
        }
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let total_count = nodes.len();
        Self { nodes, total_count }
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|node| node.id.clone()).collect()
    }
}

/// Result of a traversal query
#[derive(Debug, Clone, Serialize)]
pub struct TraversalResult {
    /// Starting node
    pub origin: NodeId,
    /// Nodes discovered at each depth level
    /// Level 0 = origin, Level 1 = direct dependencies, etc.
    pub levels: Vec<Vec<Node>>,
    /// Edges traversed
    pub edges: Vec<Edge>,
}

impl TraversalResult {
    pub fn new(origin: NodeId) -> Self {
        Self {
            origin,
            levels: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Get all nodes across all levels (excluding origin)
    pub fn all_nodes(&self) -> Vec<&Node> {
        self.levels.iter().skip(1).flatten().collect()
    }

    /// Get nodes at a specific depth
    pub fn at_depth(&self, depth: usize) -> &[Node] {
        self.levels.get(depth).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Get the maximum depth reached
    pub fn max_depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }
}
