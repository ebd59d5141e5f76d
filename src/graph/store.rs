//! InfraStore: the single authoritative, mutable infrastructure graph
//!
//! Every mutation keeps parent/child back-references consistent, the
//! containment hierarchy a forest and the dependency edges acyclic.
//! Refused operations leave the state untouched and report through their
//! return value; they never error.

use super::dependency::{check_dependency, EdgeRejection};
use super::document::GraphDocument;
use super::edge::{Edge, EdgeId};
use super::engine::InfraResult;
use super::hierarchy::{can_move, descendants, valid_drop_targets, DropTarget};
use super::invariants::{ensure_graph_invariants, graph_invariant_violations, InvariantViolation};
use super::node::{Node, NodeId, NodeStatus, Params, Position, ResourceType};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Offset applied to a duplicated node's position
const DUPLICATE_OFFSET: f64 = 50.0;

/// Active search query and the nodes it matched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub highlighted: Vec<NodeId>,
}

/// Everything the store owns
///
/// Only `nodes` and `edges` are exported; the rest is runtime state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphState {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub selected: Option<NodeId>,
    pub statuses: HashMap<NodeId, NodeStatus>,
    pub search: SearchState,
}

/// Partial update for [`InfraStore::update_node`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    pub name: Option<String>,
    /// Replaces the parameter map as a whole
    pub params: Option<Params>,
    pub position: Option<Position>,
}

impl NodeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.params.is_none() && self.position.is_none()
    }
}

/// The graph store
#[derive(Debug, Clone, Default)]
pub struct InfraStore {
    state: GraphState,
    /// Node id -> position in `state.nodes`
    index: HashMap<NodeId, usize>,
}

impl InfraStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store over existing state, trusted as-is
    pub fn with_state(state: GraphState) -> Self {
        let mut store = Self {
            state,
            index: HashMap::new(),
        };
        store.reindex();
        store
    }

    /// Create a store holding an imported document
    pub fn from_document(document: GraphDocument) -> Self {
        let mut store = Self::new();
        store.import_graph(document);
        store
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn into_state(self) -> GraphState {
        self.state
    }

    // === Reads ===

    pub fn nodes(&self) -> &[Node] {
        &self.state.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.state.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.state.nodes[i])
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.state.edges.iter().find(|edge| &edge.id == id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.state.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.state.edges.len()
    }

    /// Direct children of `id`, in insertion order
    pub fn children_of(&self, id: &NodeId) -> Vec<&Node> {
        self.node(id)
            .map(|node| node.children.iter().filter_map(|c| self.node(c)).collect())
            .unwrap_or_default()
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<&Node> {
        self.node(id)
            .and_then(|node| node.parent.as_ref())
            .and_then(|parent| self.node(parent))
    }

    /// Nodes that `id` depends on (outgoing edge targets)
    pub fn dependencies_of(&self, id: &NodeId) -> Vec<&Node> {
        self.state
            .edges
            .iter()
            .filter(|edge| &edge.source == id)
            .filter_map(|edge| self.node(&edge.target))
            .collect()
    }

    /// Nodes that depend on `id` (incoming edge sources)
    pub fn dependents_of(&self, id: &NodeId) -> Vec<&Node> {
        self.state
            .edges
            .iter()
            .filter(|edge| &edge.target == id)
            .filter_map(|edge| self.node(&edge.source))
            .collect()
    }

    pub fn valid_drop_targets(&self, resource_type: ResourceType) -> Vec<DropTarget> {
        valid_drop_targets(resource_type, &self.state.nodes)
    }

    /// Audit the current graph against every structural invariant
    pub fn violations(&self) -> Vec<InvariantViolation> {
        graph_invariant_violations(&self.state.nodes, &self.state.edges)
    }

    // === Selection, status, search ===

    pub fn selected_node(&self) -> Option<&Node> {
        self.state.selected.as_ref().and_then(|id| self.node(id))
    }

    /// Select a node, or clear the selection with `None`
    ///
    /// Returns `false` (selection unchanged) for an unknown id.
    pub fn select_node(&mut self, id: Option<&NodeId>) -> bool {
        match id {
            None => {
                self.state.selected = None;
                true
            }
            Some(id) if self.contains_node(id) => {
                self.state.selected = Some(id.clone());
                true
            }
            Some(_) => false,
        }
    }

    /// Select a node so a view can bring it into focus
    pub fn focus_node(&mut self, id: &NodeId) -> bool {
        self.select_node(Some(id))
    }

    /// Deployment status; `None` for unknown nodes
    pub fn node_status(&self, id: &NodeId) -> Option<NodeStatus> {
        self.contains_node(id)
            .then(|| self.state.statuses.get(id).copied().unwrap_or_default())
    }

    pub fn set_node_status(&mut self, id: &NodeId, status: NodeStatus) -> bool {
        if !self.contains_node(id) {
            return false;
        }
        self.state.statuses.insert(id.clone(), status);
        true
    }

    pub fn search_state(&self) -> &SearchState {
        &self.state.search
    }

    /// Highlight nodes whose id, type tag or name contains `query`
    ///
    /// Matching is case-insensitive. A blank query clears the search.
    pub fn search(&mut self, query: &str) -> Vec<NodeId> {
        let needle = query.trim().to_lowercase();
        let highlighted: Vec<NodeId> = if needle.is_empty() {
            Vec::new()
        } else {
            self.state
                .nodes
                .iter()
                .filter(|node| node_matches(node, &needle))
                .map(|node| node.id.clone())
                .collect()
        };

        self.state.search = SearchState {
            query: query.to_string(),
            highlighted: highlighted.clone(),
        };
        highlighted
    }

    pub fn clear_search(&mut self) {
        self.state.search = SearchState::default();
    }

    // === Node mutations ===

    /// Add a node with default data and return its id
    ///
    /// No placement check happens here; callers validate with `can_place`
    /// first. An unknown `parent` puts the node at root level.
    pub fn add_node(
        &mut self,
        resource_type: ResourceType,
        position: Option<Position>,
        parent: Option<&NodeId>,
    ) -> NodeId {
        let mut node = Node::new(resource_type).at(position.unwrap_or_default());
        self.insert_node(&mut node, parent);
        let id = node.id.clone();
        self.push_node(node);
        debug!(%id, %resource_type, "added node");
        id
    }

    /// Merge `update` into a node; `false` for an unknown id
    pub fn update_node(&mut self, id: &NodeId, update: NodeUpdate) -> bool {
        let Some(&i) = self.index.get(id) else {
            debug!(%id, "update ignored: unknown node");
            return false;
        };
        let node = &mut self.state.nodes[i];
        if let Some(name) = update.name {
            node.data.name = name;
        }
        if let Some(params) = update.params {
            node.data.params = params;
        }
        if let Some(position) = update.position {
            node.position = Some(position);
        }
        debug!(%id, "updated node");
        true
    }

    /// Delete a node with all its descendants and every touching edge
    ///
    /// Returns the removed ids, empty for an unknown id.
    pub fn delete_node(&mut self, id: &NodeId) -> Vec<NodeId> {
        let Some(parent) = self.node(id).map(|node| node.parent.clone()) else {
            debug!(%id, "delete ignored: unknown node");
            return Vec::new();
        };

        let mut removed = vec![id.clone()];
        removed.extend(descendants(id, &self.state.nodes));
        let doomed: HashSet<&NodeId> = removed.iter().collect();

        if let Some(parent) = parent.and_then(|p| self.index.get(&p).copied()) {
            self.state.nodes[parent].children.retain(|child| child != id);
        }
        self.state.nodes.retain(|node| !doomed.contains(&node.id));
        let before = self.state.edges.len();
        self.state
            .edges
            .retain(|edge| !doomed.contains(&edge.source) && !doomed.contains(&edge.target));
        let edges_removed = before - self.state.edges.len();

        self.state.statuses.retain(|node_id, _| !doomed.contains(node_id));
        if self
            .state
            .selected
            .as_ref()
            .is_some_and(|selected| doomed.contains(selected))
        {
            self.state.selected = None;
        }
        self.state
            .search
            .highlighted
            .retain(|node_id| !doomed.contains(node_id));

        self.reindex();
        debug!(%id, nodes = removed.len(), edges = edges_removed, "deleted node");
        removed
    }

    /// Reposition a node and optionally re-parent it (`None` means root)
    ///
    /// The placement rules apply only when the parent changes.
    pub fn move_node(
        &mut self,
        id: &NodeId,
        position: Position,
        new_parent: Option<&NodeId>,
    ) -> bool {
        let Some(&i) = self.index.get(id) else {
            debug!(%id, "move refused: unknown node");
            return false;
        };
        let old_parent = self.state.nodes[i].parent.clone();

        if old_parent.as_ref() != new_parent {
            if !can_move(id, new_parent, &self.state.nodes) {
                warn!(
                    %id,
                    parent = new_parent.map_or(DropTarget::ROOT_MARKER, NodeId::as_str),
                    "move refused by placement rules"
                );
                return false;
            }
            if let Some(p) = old_parent.and_then(|p| self.index.get(&p).copied()) {
                self.state.nodes[p].children.retain(|child| child != id);
            }
            if let Some(&p) = new_parent.and_then(|p| self.index.get(p)) {
                self.state.nodes[p].children.push(id.clone());
            }
            self.state.nodes[i].parent = new_parent.cloned();
        }

        self.state.nodes[i].position = Some(position);
        debug!(%id, "moved node");
        true
    }

    /// Copy a node's type, parent and data into a new node, offset on canvas
    ///
    /// Children and edges are not copied.
    pub fn duplicate_node(&mut self, id: &NodeId) -> Option<NodeId> {
        let original = self.node(id)?;
        let mut copy = Node {
            id: NodeId::new(),
            resource_type: original.resource_type,
            parent: None,
            children: Vec::new(),
            data: original.data.clone(),
            position: Some(
                original
                    .position
                    .unwrap_or_default()
                    .offset(DUPLICATE_OFFSET, DUPLICATE_OFFSET),
            ),
        };
        let parent = original.parent.clone();

        self.insert_node(&mut copy, parent.as_ref());
        let copy_id = copy.id.clone();
        self.push_node(copy);
        debug!(%id, copy = %copy_id, "duplicated node");
        Some(copy_id)
    }

    // === Edge mutations ===

    /// Add a dependency `source -> target`, returning `false` if refused
    pub fn add_edge(&mut self, source: &NodeId, target: &NodeId) -> bool {
        self.try_add_edge(source, target).is_ok()
    }

    /// Like [`InfraStore::add_edge`], reporting the refusal reason
    pub fn try_add_edge(&mut self, source: &NodeId, target: &NodeId) -> Result<EdgeId, EdgeRejection> {
        let checked = if self.contains_node(source) && self.contains_node(target) {
            check_dependency(source, target, &self.state.edges)
        } else {
            Err(EdgeRejection::UnknownNode)
        };
        if let Err(rejection) = checked {
            warn!(%source, %target, %rejection, "dependency refused");
            return Err(rejection);
        }

        let edge = Edge::dependency(source.clone(), target.clone());
        let id = edge.id.clone();
        self.state.edges.push(edge);
        debug!(%id, %source, %target, "added dependency");
        Ok(id)
    }

    /// Remove an edge; `false` for an unknown id
    pub fn delete_edge(&mut self, id: &EdgeId) -> bool {
        let before = self.state.edges.len();
        self.state.edges.retain(|edge| &edge.id != id);
        let removed = self.state.edges.len() != before;
        if removed {
            debug!(%id, "deleted dependency");
        }
        removed
    }

    // === Whole-graph operations ===

    pub fn export_graph(&self) -> GraphDocument {
        GraphDocument::new(self.state.nodes.clone(), self.state.edges.clone())
    }

    /// Replace the graph verbatim
    ///
    /// The document is trusted. Statuses reset to `not_applied`; selection
    /// and search are cleared.
    pub fn import_graph(&mut self, document: GraphDocument) {
        let statuses = document
            .nodes
            .iter()
            .map(|node| (node.id.clone(), NodeStatus::NotApplied))
            .collect();
        self.state = GraphState {
            nodes: document.nodes,
            edges: document.edges,
            selected: None,
            statuses,
            search: SearchState::default(),
        };
        self.reindex();
        debug!(
            nodes = self.state.nodes.len(),
            edges = self.state.edges.len(),
            "imported graph"
        );
    }

    /// Replace the graph only if the document satisfies every invariant
    pub fn import_graph_strict(&mut self, document: GraphDocument) -> InfraResult<()> {
        if let Err(err) = ensure_graph_invariants(&document.nodes, &document.edges) {
            warn!(%err, "import refused");
            return Err(err);
        }
        self.import_graph(document);
        Ok(())
    }

    /// Remove everything, including runtime state
    pub fn clear_graph(&mut self) {
        self.state = GraphState::default();
        self.index.clear();
        debug!("cleared graph");
    }

    // === Internals ===

    /// Attach `node` under `parent` if it exists, else leave it at root
    fn insert_node(&mut self, node: &mut Node, parent: Option<&NodeId>) {
        let Some(parent_id) = parent else {
            return;
        };
        match self.index.get(parent_id) {
            Some(&p) => {
                self.state.nodes[p].children.push(node.id.clone());
                node.parent = Some(parent_id.clone());
            }
            None => {
                warn!(parent = %parent_id, "unknown parent, placing node at root");
            }
        }
    }

    fn push_node(&mut self, node: Node) {
        self.index.insert(node.id.clone(), self.state.nodes.len());
        self.state.statuses.insert(node.id.clone(), NodeStatus::NotApplied);
        self.state.nodes.push(node);
    }

    fn reindex(&mut self) {
        self.index = self
            .state
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), i))
            .collect();
    }
}

fn node_matches(node: &Node, needle: &str) -> bool {
    node.id.as_str().to_lowercase().contains(needle)
        || node.resource_type.as_str().contains(needle)
        || node.data.name.to_lowercase().contains(needle)
}

impl From<GraphDocument> for InfraStore {
    fn from(document: GraphDocument) -> Self {
        Self::from_document(document)
    }
}
