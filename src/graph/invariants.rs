//! Whole-graph audit of the structural invariants
//!
//! The store keeps these invariants by construction. Imported documents are
//! not built through the store, so this module checks them after the fact.

use super::dependency::apply_order;
use super::edge::{Edge, EdgeId};
use super::engine::{InfraError, InfraResult};
use super::hierarchy::can_place;
use super::node::{Node, NodeId, ResourceType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A single broken invariant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvariantViolation {
    DuplicateNodeId {
        node_id: NodeId,
    },
    UnknownParent {
        node_id: NodeId,
        parent_id: NodeId,
    },
    /// A `children` entry that is missing or points elsewhere
    ChildMismatch {
        parent_id: NodeId,
        child_id: NodeId,
    },
    /// A node whose parent does not list it as a child
    MissingChildReference {
        parent_id: NodeId,
        child_id: NodeId,
    },
    ContainmentCycle {
        node_id: NodeId,
    },
    IllegalPlacement {
        node_id: NodeId,
        resource_type: ResourceType,
        parent_id: Option<NodeId>,
    },
    UnknownEdgeEndpoint {
        edge_id: EdgeId,
        missing_node_id: NodeId,
    },
    SelfLoop {
        edge_id: EdgeId,
    },
    DuplicateEdge {
        source: NodeId,
        target: NodeId,
    },
    DependencyCycle,
}

impl InvariantViolation {
    pub const fn code(&self) -> &'static str {
        match self {
            InvariantViolation::DuplicateNodeId { .. } => "graph_duplicate_node_id",
            InvariantViolation::UnknownParent { .. } => "graph_unknown_parent",
            InvariantViolation::ChildMismatch { .. } => "graph_child_mismatch",
            InvariantViolation::MissingChildReference { .. } => "graph_missing_child_reference",
            InvariantViolation::ContainmentCycle { .. } => "graph_containment_cycle",
            InvariantViolation::IllegalPlacement { .. } => "graph_illegal_placement",
            InvariantViolation::UnknownEdgeEndpoint { .. } => "graph_unknown_node_reference",
            InvariantViolation::SelfLoop { .. } => "graph_self_loop_violation",
            InvariantViolation::DuplicateEdge { .. } => "graph_duplicate_edge",
            InvariantViolation::DependencyCycle => "graph_dag_cycle",
        }
    }

    pub const fn public_message(&self) -> &'static str {
        match self {
            InvariantViolation::DuplicateNodeId { .. } => "Node IDs must be unique within a graph",
            InvariantViolation::UnknownParent { .. } => "Node references a parent that does not exist",
            InvariantViolation::ChildMismatch { .. } => {
                "Child entry does not point back at its parent"
            }
            InvariantViolation::MissingChildReference { .. } => {
                "Parent does not list the node among its children"
            }
            InvariantViolation::ContainmentCycle { .. } => "Containment hierarchy must be acyclic",
            InvariantViolation::IllegalPlacement { .. } => {
                "Resource type cannot be placed in this container"
            }
            InvariantViolation::UnknownEdgeEndpoint { .. } => {
                "Edge references a node that does not exist"
            }
            InvariantViolation::SelfLoop { .. } => "A resource cannot depend on itself",
            InvariantViolation::DuplicateEdge { .. } => "Dependency edges must be unique",
            InvariantViolation::DependencyCycle => "Dependency graph must be acyclic",
        }
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvariantViolation::DuplicateNodeId { node_id }
            | InvariantViolation::ContainmentCycle { node_id } => {
                write!(f, "{} ({})", self.public_message(), node_id)
            }
            InvariantViolation::UnknownParent { node_id, parent_id } => {
                write!(f, "{} ({} -> {})", self.public_message(), node_id, parent_id)
            }
            InvariantViolation::ChildMismatch { parent_id, child_id }
            | InvariantViolation::MissingChildReference { parent_id, child_id } => {
                write!(f, "{} ({} / {})", self.public_message(), parent_id, child_id)
            }
            InvariantViolation::IllegalPlacement {
                node_id,
                resource_type,
                parent_id,
            } => match parent_id {
                Some(parent_id) => write!(
                    f,
                    "{} ({} {} in {})",
                    self.public_message(),
                    resource_type,
                    node_id,
                    parent_id
                ),
                None => write!(
                    f,
                    "{} ({} {} at root)",
                    self.public_message(),
                    resource_type,
                    node_id
                ),
            },
            InvariantViolation::UnknownEdgeEndpoint {
                edge_id,
                missing_node_id,
            } => write!(f, "{} ({} -> {})", self.public_message(), edge_id, missing_node_id),
            InvariantViolation::SelfLoop { edge_id } => {
                write!(f, "{} ({})", self.public_message(), edge_id)
            }
            InvariantViolation::DuplicateEdge { source, target } => {
                write!(f, "{} ({} -> {})", self.public_message(), source, target)
            }
            InvariantViolation::DependencyCycle => f.write_str(self.public_message()),
        }
    }
}

/// Every invariant the graph breaks, in a stable order
pub fn graph_invariant_violations(nodes: &[Node], edges: &[Edge]) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    let mut by_id: HashMap<&NodeId, &Node> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        if by_id.insert(&node.id, node).is_some() {
            violations.push(InvariantViolation::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }

    for node in nodes {
        for child_id in &node.children {
            let points_back = by_id
                .get(child_id)
                .is_some_and(|child| child.parent.as_ref() == Some(&node.id));
            if !points_back {
                violations.push(InvariantViolation::ChildMismatch {
                    parent_id: node.id.clone(),
                    child_id: child_id.clone(),
                });
            }
        }

        let Some(parent_id) = &node.parent else {
            continue;
        };
        match by_id.get(parent_id) {
            None => violations.push(InvariantViolation::UnknownParent {
                node_id: node.id.clone(),
                parent_id: parent_id.clone(),
            }),
            Some(parent) if !parent.children.contains(&node.id) => {
                violations.push(InvariantViolation::MissingChildReference {
                    parent_id: parent_id.clone(),
                    child_id: node.id.clone(),
                });
            }
            Some(_) => {}
        }
    }

    violations.extend(containment_cycles(nodes, &by_id));

    for node in nodes {
        let parent_known = node.parent.as_ref().map_or(true, |p| by_id.contains_key(p));
        if parent_known && !can_place(node.resource_type, node.parent.as_ref(), nodes) {
            violations.push(InvariantViolation::IllegalPlacement {
                node_id: node.id.clone(),
                resource_type: node.resource_type,
                parent_id: node.parent.clone(),
            });
        }
    }

    let mut seen_edges: HashSet<(&NodeId, &NodeId)> = HashSet::with_capacity(edges.len());
    let mut edges_ok = true;
    for edge in edges {
        if let Some(missing) = [&edge.source, &edge.target]
            .into_iter()
            .find(|id| !by_id.contains_key(id))
        {
            violations.push(InvariantViolation::UnknownEdgeEndpoint {
                edge_id: edge.id.clone(),
                missing_node_id: missing.clone(),
            });
            edges_ok = false;
            continue;
        }
        if edge.source == edge.target {
            violations.push(InvariantViolation::SelfLoop {
                edge_id: edge.id.clone(),
            });
            edges_ok = false;
        }
        if !seen_edges.insert((&edge.source, &edge.target)) {
            violations.push(InvariantViolation::DuplicateEdge {
                source: edge.source.clone(),
                target: edge.target.clone(),
            });
        }
    }

    // A self-loop is already a cycle; only report the DAG check separately
    // when every edge is otherwise well formed.
    if edges_ok && apply_order(nodes, edges).is_none() {
        violations.push(InvariantViolation::DependencyCycle);
    }

    violations
}

/// Fail with every violation if the graph breaks any invariant
pub fn ensure_graph_invariants(nodes: &[Node], edges: &[Edge]) -> InfraResult<()> {
    let violations = graph_invariant_violations(nodes, edges);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(InfraError::InvariantViolations(violations))
    }
}

/// One violation per node that sits on a parent-pointer cycle
fn containment_cycles(nodes: &[Node], by_id: &HashMap<&NodeId, &Node>) -> Vec<InvariantViolation> {
    let mut on_cycle: HashSet<&NodeId> = HashSet::new();
    let mut settled: HashSet<&NodeId> = HashSet::new();

    for node in nodes {
        let mut path: Vec<&NodeId> = Vec::new();
        let mut in_path: HashSet<&NodeId> = HashSet::new();
        let mut current = Some(&node.id);

        while let Some(id) = current {
            if settled.contains(id) {
                break;
            }
            if !in_path.insert(id) {
                let start = path.iter().position(|p| *p == id).unwrap_or(0);
                on_cycle.extend(path[start..].iter().copied());
                break;
            }
            path.push(id);
            current = by_id.get(id).and_then(|n| n.parent.as_ref());
        }

        settled.extend(path);
    }

    nodes
        .iter()
        .filter(|node| on_cycle.contains(&node.id))
        .map(|node| InvariantViolation::ContainmentCycle {
            node_id: node.id.clone(),
        })
        .collect()
}
