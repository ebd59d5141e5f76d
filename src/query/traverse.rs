//! Dependency traversal

use super::types::{Direction, TraversalResult};
use crate::graph::{Edge, InfraStore, Node, NodeId};
use std::collections::{HashMap, HashSet};

/// Query for walking dependency edges from a starting node
#[derive(Debug, Clone)]
pub struct TraverseQuery {
    /// Starting node ID
    pub origin: NodeId,
    /// Maximum depth to traverse (0 = origin only, 1 = direct neighbors, etc.)
    pub max_depth: usize,
    /// Direction to traverse edges
    pub direction: Direction,
}

impl TraverseQuery {
    /// Create a new traversal query from a starting node
    pub fn from(origin: NodeId) -> Self {
        Self {
            origin,
            max_depth: 1,
            direction: Direction::Outgoing,
        }
    }

    /// Set the maximum traversal depth
    pub fn depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the traversal direction
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Execute the traversal (breadth-first) against a store
    pub fn execute(&self, store: &InfraStore) -> TraversalResult {
        let mut result = TraversalResult::new(self.origin.clone());

        let Some(origin_node) = store.node(&self.origin) else {
            return result;
        };

        let edge_index = EdgeIndex::build(store.edges());

        let mut visited: HashSet<&NodeId> = HashSet::new();
        let mut current_level: Vec<&NodeId> = vec![&origin_node.id];
        visited.insert(&origin_node.id);

        result.levels.push(vec![origin_node.clone()]);

        for _depth in 0..self.max_depth {
            if current_level.is_empty() {
                break;
            }

            let mut next_level: Vec<&NodeId> = Vec::new();
            let mut level_nodes: Vec<Node> = Vec::new();

            for node_id in &current_level {
                for edge in self.edges_for(node_id, &edge_index) {
                    let neighbor_id = if &edge.source == *node_id {
                        &edge.target
                    } else {
                        &edge.source
                    };

                    if visited.contains(neighbor_id) {
                        continue;
                    }

                    if let Some(neighbor) = store.node(neighbor_id) {
                        visited.insert(&neighbor.id);
                        next_level.push(&neighbor.id);
                        level_nodes.push(neighbor.clone());
                        result.edges.push(edge.clone());
                    }
                }
            }

            if !level_nodes.is_empty() {
                result.levels.push(level_nodes);
            }
            current_level = next_level;
        }

        result
    }

    fn edges_for<'a>(&self, node_id: &NodeId, index: &EdgeIndex<'a>) -> Vec<&'a Edge> {
        match self.direction {
            Direction::Outgoing => index.outgoing(node_id),
            Direction::Incoming => index.incoming(node_id),
            Direction::Both => {
                let mut edges = index.outgoing(node_id);
                edges.extend(index.incoming(node_id));
                edges
            }
        }
    }
}

/// Index for fast edge lookups
struct EdgeIndex<'a> {
    outgoing: HashMap<&'a NodeId, Vec<&'a Edge>>,
    incoming: HashMap<&'a NodeId, Vec<&'a Edge>>,
}

impl<'a> EdgeIndex<'a> {
    fn build(edges: &'a [Edge]) -> Self {
        let mut outgoing: HashMap<&NodeId, Vec<&Edge>> = HashMap::new();
        let mut incoming: HashMap<&NodeId, Vec<&Edge>> = HashMap::new();

        for edge in edges {
            outgoing.entry(&edge.source).or_default().push(edge);
            incoming.entry(&edge.target).or_default().push(edge);
        }

        Self { outgoing, incoming }
    }

    fn outgoing(&self, node_id: &NodeId) -> Vec<&'a Edge> {
        self.outgoing.get(node_id).cloned().unwrap_or_default()
    }

    fn incoming(&self, node_id: &NodeId) -> Vec<&'a Edge> {
        self.incoming.get(node_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ResourceType;

    /// web -> db -> role, web -> bucket
    fn create_test_store() -> (InfraStore, [NodeId; 4]) {
        let mut store = InfraStore::new();
        let web = store.add_node(ResourceType::Instance, None, None);
        let db = store.add_node(ResourceType::Database, None, None);
        let role = store.add_node(ResourceType::AccessRole, None, None);
        let bucket = store.add_node(ResourceType::ObjectStore, None, None);

        assert!(store.add_edge(&web, &db));
        assert!(store.add_edge(&db, &role));
        assert!(store.add_edge(&web, &bucket));

        (store, [web, db, role, bucket])
    }

    fn ids(nodes: &[Node]) -> Vec<NodeId> {
        nodes.iter().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn test_traverse_depth_one() {
        let (store, [web, db, _, bucket]) = create_test_store();
        let result = TraverseQuery::from(web.clone()).depth(1).execute(&store);

        assert_eq!(result.levels.len(), 2);
        assert_eq!(ids(result.at_depth(0)), vec![web]);
        assert_eq!(ids(result.at_depth(1)), vec![db, bucket]);
        assert_eq!(result.edges.len(), 2);
    }

    #[test]
    fn test_traverse_depth_two() {
        let (store, [web, _, role, _]) = create_test_store();
        let result = TraverseQuery::from(web).depth(2).execute(&store);

        assert_eq!(result.max_depth(), 2);
        assert_eq!(ids(result.at_depth(2)), vec![role]);
        assert_eq!(result.all_nodes().len(), 3);
    }

    #[test]
    fn test_traverse_incoming() {
        let (store, [web, db, role, _]) = create_test_store();
        let result = TraverseQuery::from(role)
            .depth(5)
            .direction(Direction::Incoming)
            .execute(&store);

        assert_eq!(ids(result.at_depth(1)), vec![db]);
        assert_eq!(ids(result.at_depth(2)), vec![web]);
        assert_eq!(result.max_depth(), 2);
    }

    #[test]
    fn test_traverse_both_directions() {
        let (store, [web, db, role, _]) = create_test_store();
        let result = TraverseQuery::from(db)
            .depth(1)
            .direction(Direction::Both)
            .execute(&store);

        assert_eq!(ids(result.at_depth(1)), vec![role, web]);
    }

    #[test]
    fn test_traverse_nonexistent_origin() {
        let (store, _) = create_test_store();
        let fake_id = NodeId::from_string("nonexistent");
        let result = TraverseQuery::from(fake_id.clone()).depth(1).execute(&store);

        assert_eq!(result.origin, fake_id);
        assert!(result.levels.is_empty());
    }

    #[test]
    fn test_direction_parses() {
        assert_eq!("in".parse::<Direction>().unwrap(), Direction::Incoming);
        assert_eq!("both".parse::<Direction>().unwrap(), Direction::Both);
        assert!("sideways".parse::<Direction>().is_err());
    }
}
