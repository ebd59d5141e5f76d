//! Core graph data structures and rules

mod dependency;
mod document;
mod edge;
mod engine;
mod hierarchy;
mod invariants;
mod node;
mod saved;
mod store;

#[cfg(test)]
mod tests;

pub use dependency::{apply_order, can_connect, check_dependency, reaches, EdgeRejection};
pub use document::GraphDocument;
pub use edge::{Edge, EdgeId, EdgeKind};
pub use engine::{GraphLibrary, InfraError, InfraResult};
pub use hierarchy::{can_move, can_place, descendants, is_ancestor, valid_drop_targets, DropTarget};
pub use invariants::{ensure_graph_invariants, graph_invariant_violations, InvariantViolation};
pub use node::{Node, NodeData, NodeId, NodeStatus, Params, Position, PropertyValue, ResourceType};
pub use saved::{GraphId, GraphSummary, GraphUpdate, SavedGraph};
pub use store::{GraphState, InfraStore, NodeUpdate, SearchState};
