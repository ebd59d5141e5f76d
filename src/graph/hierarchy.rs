//! Containment rules: where a resource may be placed and moved
//!
//! All functions are pure predicates over a node slice. They never fail;
//! a `false` or empty answer means the caller should refuse the operation.

use super::node::{Node, NodeId, ResourceType};
use std::collections::{HashMap, HashSet};

/// A place a node of some type may be dropped
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DropTarget {
    /// Root level, no container
    Root,
    /// Inside an existing node
    Node(NodeId),
}

impl DropTarget {
    /// Marker used for root level in listings
    pub const ROOT_MARKER: &'static str = "root";

    pub fn as_str(&self) -> &str {
        match self {
            DropTarget::Root => Self::ROOT_MARKER,
            DropTarget::Node(id) => id.as_str(),
        }
    }

    /// The parent id this target implies (`None` for root)
    pub fn parent(&self) -> Option<&NodeId> {
        match self {
            DropTarget::Root => None,
            DropTarget::Node(id) => Some(id),
        }
    }
}

impl std::fmt::Display for DropTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a node of `resource_type` may be placed under `parent`
///
/// Root placement is allowed for network containers and global resources.
/// Nested placement requires an existing parent whose type admits the child.
/// Global resources are never nested because no container lists them.
pub fn can_place(resource_type: ResourceType, parent: Option<&NodeId>, nodes: &[Node]) -> bool {
    let Some(parent_id) = parent else {
        return resource_type.may_be_root();
    };

    match nodes.iter().find(|node| &node.id == parent_id) {
        Some(parent) => parent.resource_type.can_contain(resource_type),
        None => false,
    }
}

/// Whether `node_id` may be re-parented under `new_parent`
///
/// Rejects unknown nodes, self-parenting and moves under one of the node's
/// own descendants, then applies the placement table.
pub fn can_move(node_id: &NodeId, new_parent: Option<&NodeId>, nodes: &[Node]) -> bool {
    let Some(node) = nodes.iter().find(|node| &node.id == node_id) else {
        return false;
    };

    if let Some(parent_id) = new_parent {
        if parent_id == node_id {
            return false;
        }
        if is_ancestor(node_id, parent_id, nodes) {
            return false;
        }
    }

    can_place(node.resource_type, new_parent, nodes)
}

/// Every place a node of `resource_type` could be dropped
///
/// Existing nodes come first in slice order; `Root` is appended last when
/// root placement is legal.
pub fn valid_drop_targets(resource_type: ResourceType, nodes: &[Node]) -> Vec<DropTarget> {
    let mut targets: Vec<DropTarget> = nodes
        .iter()
        .filter(|node| can_place(resource_type, Some(&node.id), nodes))
        .map(|node| DropTarget::Node(node.id.clone()))
        .collect();

    if can_place(resource_type, None, nodes) {
        targets.push(DropTarget::Root);
    }

    targets
}

/// Whether `ancestor` appears on the parent chain above `node_id`
///
/// Walks `parent` pointers upward. A corrupted (cyclic) chain stops at the
/// first revisited node.
pub fn is_ancestor(ancestor: &NodeId, node_id: &NodeId, nodes: &[Node]) -> bool {
    let parents: HashMap<&NodeId, &NodeId> = nodes
        .iter()
        .filter_map(|node| node.parent.as_ref().map(|parent| (&node.id, parent)))
        .collect();

    let mut seen: HashSet<&NodeId> = HashSet::new();
    let mut current = node_id;
    while let Some(parent) = parents.get(current) {
        if *parent == ancestor {
            return true;
        }
        if !seen.insert(parent) {
            return false;
        }
        current = parent;
    }

    false
}

/// `root` plus all nodes reachable through `children` lists, excluding `root`
///
/// Returned in depth-first pre-order.
pub fn descendants(root: &NodeId, nodes: &[Node]) -> Vec<NodeId> {
    let children: HashMap<&NodeId, &[NodeId]> = nodes
        .iter()
        .map(|node| (&node.id, node.children.as_slice()))
        .collect();

    let mut found = Vec::new();
    let mut seen: HashSet<&NodeId> = HashSet::from([root]);
    let mut stack: Vec<&NodeId> = children
        .get(root)
        .map(|kids| kids.iter().rev().collect())
        .unwrap_or_default();

    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        found.push(id.clone());
        if let Some(kids) = children.get(id) {
            stack.extend(kids.iter().rev());
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    /// vpc -> subnet -> instance, plus a root bucket
    fn sample() -> (Vec<Node>, NodeId, NodeId, NodeId, NodeId) {
        let mut vpc = Node::new(ResourceType::Vpc);
        let mut subnet = Node::new(ResourceType::Subnet).with_parent(vpc.id.clone());
        let instance = Node::new(ResourceType::Instance).with_parent(subnet.id.clone());
        let bucket = Node::new(ResourceType::ObjectStore);
        vpc.children.push(subnet.id.clone());
        subnet.children.push(instance.id.clone());

        let ids = (
            vpc.id.clone(),
            subnet.id.clone(),
            instance.id.clone(),
            bucket.id.clone(),
        );
        (vec![vpc, subnet, instance, bucket], ids.0, ids.1, ids.2, ids.3)
    }

    #[test]
    fn test_subnet_fits_in_vpc() {
        let (nodes, vpc, ..) = sample();
        assert!(can_place(ResourceType::Subnet, Some(&vpc), &nodes));
        assert!(can_place(ResourceType::LoadBalancer, Some(&vpc), &nodes));
        assert!(!can_place(ResourceType::Instance, Some(&vpc), &nodes));
    }

    #[test]
    fn test_root_placement() {
        let nodes: Vec<Node> = Vec::new();
        assert!(!can_place(ResourceType::Instance, None, &nodes));
        assert!(!can_place(ResourceType::Subnet, None, &nodes));
        assert!(can_place(ResourceType::ObjectStore, None, &nodes));
        assert!(can_place(ResourceType::AccessRole, None, &nodes));
        assert!(can_place(ResourceType::Vpc, None, &nodes));
    }

    #[test]
    fn test_global_types_never_nest() {
        let (nodes, vpc, subnet, ..) = sample();
        assert!(!can_place(ResourceType::ObjectStore, Some(&vpc), &nodes));
        assert!(!can_place(ResourceType::AccessRole, Some(&subnet), &nodes));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let (nodes, ..) = sample();
        let ghost = NodeId::from_string("ghost");
        assert!(!can_place(ResourceType::Subnet, Some(&ghost), &nodes));
    }

    #[test]
    fn test_move_rejects_self_parent() {
        let (nodes, vpc, ..) = sample();
        assert!(!can_move(&vpc, Some(&vpc), &nodes));
    }

    #[test]
    fn test_move_rejects_descendant_parent() {
        let (mut nodes, vpc, subnet, ..) = sample();
        assert!(is_ancestor(&vpc, &subnet, &nodes));
        assert!(!can_move(&vpc, Some(&subnet), &nodes));

        let other_vpc = Node::new(ResourceType::Vpc);
        let other = other_vpc.id.clone();
        nodes.push(other_vpc);
        assert!(can_move(&subnet, Some(&other), &nodes));
    }

    #[test]
    fn test_move_unknown_node_rejected() {
        let (nodes, vpc, ..) = sample();
        assert!(!can_move(&NodeId::from_string("ghost"), Some(&vpc), &nodes));
    }

    #[test]
    fn test_move_to_root_uses_type_rules() {
        let (nodes, _, subnet, _, bucket) = sample();
        assert!(!can_move(&subnet, None, &nodes));
        assert!(can_move(&bucket, None, &nodes));
    }

    #[test]
    fn test_drop_targets_for_instance() {
        let (nodes, _, subnet, ..) = sample();
        let targets = valid_drop_targets(ResourceType::Instance, &nodes);
        assert_eq!(targets, vec![DropTarget::Node(subnet)]);
    }

    #[test]
    fn test_drop_targets_include_root_last() {
        let (nodes, ..) = sample();
        let targets = valid_drop_targets(ResourceType::ObjectStore, &nodes);
        assert_eq!(targets, vec![DropTarget::Root]);
        assert_eq!(targets[0].to_string(), "root");

        let targets = valid_drop_targets(ResourceType::Vpc, &nodes);
        assert_eq!(targets, vec![DropTarget::Root]);
    }

    #[test]
    fn test_ancestor_walk_survives_parent_cycle() {
        let a = Node::new(ResourceType::Vpc);
        let b = Node::new(ResourceType::Subnet).with_parent(a.id.clone());
        let a = a.with_parent(b.id.clone());
        let start = a.id.clone();
        let c = NodeId::from_string("c");
        assert!(!is_ancestor(&c, &start, &[a, b]));
    }

    #[test]
    fn test_descendants_preorder() {
        let (nodes, vpc, subnet, instance, _) = sample();
        assert_eq!(descendants(&vpc, &nodes), vec![subnet, instance]);
    }
}
