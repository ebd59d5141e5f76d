//! infragraph: infrastructure graph model with containment and dependency rules
//!
//! Models cloud resources as a graph with two independent structures over
//! the same nodes:
//!
//! - **Containment**: a forest of parent/child links (VPC > subnet > instance)
//!   governed by a fixed placement table
//! - **Dependencies**: directed edges ("source depends on target") kept acyclic
//!
//! The [`InfraStore`] owns a graph and keeps both structures valid on every
//! mutation. Documents export to and import from a `{nodes, edges}` JSON form;
//! the [`GraphLibrary`] keeps named documents, optionally in SQLite.
//!
//! # Example
//!
//! ```
//! use infragraph::{InfraStore, ResourceType};
//!
//! let mut store = InfraStore::new();
//! let vpc = store.add_node(ResourceType::Vpc, None, None);
//! let subnet = store.add_node(ResourceType::Subnet, None, Some(&vpc));
//! let web = store.add_node(ResourceType::Instance, None, Some(&subnet));
//! let bucket = store.add_node(ResourceType::ObjectStore, None, None);
//!
//! assert!(store.add_edge(&web, &bucket));
//! assert!(!store.add_edge(&bucket, &web)); // would be a cycle
//! assert!(store.violations().is_empty());
//! ```

mod graph;
pub mod query;
pub mod storage;

pub use graph::{
    apply_order, can_connect, can_move, can_place, check_dependency, descendants,
    ensure_graph_invariants, graph_invariant_violations, is_ancestor, reaches, valid_drop_targets,
    DropTarget, Edge, EdgeId, EdgeKind, EdgeRejection, GraphDocument, GraphId, GraphLibrary,
    GraphState, GraphSummary, GraphUpdate, InfraError, InfraResult, InfraStore,
    InvariantViolation, Node, NodeData, NodeId, NodeStatus, NodeUpdate, Params, Position,
    PropertyValue, ResourceType, SavedGraph, SearchState,
};
pub use query::{Direction, FindQuery, QueryResult, TraversalResult, TraverseQuery};
pub use storage::{GraphRepository, OpenStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
