//! Common test utilities for infragraph integration tests
//!
//! Fixture graphs and the structural checks every test re-runs after
//! mutating a store.

#![allow(dead_code)]

use infragraph::{
    apply_order, GraphDocument, InfraStore, Node, NodeId, Position, ResourceType,
};
use std::collections::{HashMap, HashSet};

/// Ids of the nodes in [`three_tier`]
#[derive(Debug, Clone)]
pub struct ThreeTier {
    pub vpc: NodeId,
    pub public: NodeId,
    pub private: NodeId,
    pub lb: NodeId,
    pub web: NodeId,
    pub db: NodeId,
    pub assets: NodeId,
    pub role: NodeId,
}

/// A small web stack:
///
/// ```text
/// vpc
/// ├── public subnet ── web
/// ├── private subnet ── db
/// └── lb
/// assets (bucket), role (iam)
/// ```
///
/// Dependencies: lb -> web -> db, web -> assets, web -> role
pub fn three_tier() -> (InfraStore, ThreeTier) {
    let mut store = InfraStore::new();
    let vpc = store.add_node(ResourceType::Vpc, Some(Position::new(0.0, 0.0)), None);
    let public = store.add_node(ResourceType::Subnet, None, Some(&vpc));
    let private = store.add_node(ResourceType::Subnet, None, Some(&vpc));
    let lb = store.add_node(ResourceType::LoadBalancer, None, Some(&vpc));
    let web = store.add_node(ResourceType::Instance, None, Some(&public));
    let db = store.add_node(ResourceType::Database, None, Some(&private));
    let assets = store.add_node(ResourceType::ObjectStore, None, None);
    let role = store.add_node(ResourceType::AccessRole, None, None);

    for (source, target) in [(&lb, &web), (&web, &db), (&web, &assets), (&web, &role)] {
        assert!(store.add_edge(source, target), "fixture edge refused");
    }

    let ids = ThreeTier {
        vpc,
        public,
        private,
        lb,
        web,
        db,
        assets,
        role,
    };
    (store, ids)
}

/// Every parent lists the child and every child points back
pub fn assert_back_references(nodes: &[Node]) {
    let by_id: HashMap<&NodeId, &Node> = nodes.iter().map(|n| (&n.id, n)).collect();
    for node in nodes {
        if let Some(parent) = &node.parent {
            let parent = by_id
                .get(parent)
                .unwrap_or_else(|| panic!("{} has unknown parent {}", node.id, parent));
            assert!(
                parent.children.contains(&node.id),
                "{} missing from children of {}",
                node.id,
                parent.id
            );
        }
        for child in &node.children {
            let child = by_id
                .get(child)
                .unwrap_or_else(|| panic!("{} lists unknown child {}", node.id, child));
            assert_eq!(child.parent.as_ref(), Some(&node.id));
        }
    }
}

/// Following parent pointers from any node terminates at a root
pub fn assert_forest(nodes: &[Node]) {
    let parents: HashMap<&NodeId, Option<&NodeId>> =
        nodes.iter().map(|n| (&n.id, n.parent.as_ref())).collect();
    for node in nodes {
        let mut seen = HashSet::new();
        let mut current = Some(&node.id);
        while let Some(id) = current {
            assert!(seen.insert(id), "containment cycle through {}", id);
            current = parents.get(id).copied().flatten();
        }
    }
}

/// Dependency edges form a DAG over existing nodes, without self-loops or duplicates
pub fn assert_dependency_dag(store: &InfraStore) {
    let mut pairs = HashSet::new();
    for edge in store.edges() {
        assert_ne!(edge.source, edge.target, "self-loop {}", edge.id);
        assert!(store.node(&edge.source).is_some(), "dangling source {}", edge.id);
        assert!(store.node(&edge.target).is_some(), "dangling target {}", edge.id);
        assert!(pairs.insert((&edge.source, &edge.target)), "duplicate {}", edge.id);
    }
    assert!(
        apply_order(store.nodes(), store.edges()).is_some(),
        "dependency cycle"
    );
}

/// All structural invariants at once, cross-checked against the library audit
pub fn assert_consistent(store: &InfraStore) {
    assert_back_references(store.nodes());
    assert_forest(store.nodes());
    assert_dependency_dag(store);
    assert!(
        store.violations().is_empty(),
        "violations: {:?}",
        store.violations()
    );
}

/// Round-trip a store's export through JSON text
pub fn reimport(store: &InfraStore) -> InfraStore {
    let json = store.export_graph().to_json_pretty().expect("export");
    InfraStore::from_document(GraphDocument::from_json(&json).expect("import"))
}
