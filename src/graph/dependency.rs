//! Dependency edge rules: no self-loops, no duplicates, no cycles

use super::edge::Edge;
use super::node::{Node, NodeId};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Why a dependency edge was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EdgeRejection {
    #[error("dependency already exists")]
    Duplicate,

    #[error("a resource cannot depend on itself")]
    SelfLoop,

    #[error("dependency would introduce a cycle")]
    Cycle,

    #[error("dependency references an unknown resource")]
    UnknownNode,
}

/// Check whether `source -> target` may be added to `edges`
///
/// Checks run in order: duplicate, self-loop, cycle.
pub fn check_dependency(
    source: &NodeId,
    target: &NodeId,
    edges: &[Edge],
) -> Result<(), EdgeRejection> {
    if edges.iter().any(|edge| edge.connects(source, target)) {
        return Err(EdgeRejection::Duplicate);
    }
    if source == target {
        return Err(EdgeRejection::SelfLoop);
    }
    if reaches(target, source, edges) {
        return Err(EdgeRejection::Cycle);
    }
    Ok(())
}

/// Boolean form of [`check_dependency`]
pub fn can_connect(source: &NodeId, target: &NodeId, edges: &[Edge]) -> bool {
    check_dependency(source, target, edges).is_ok()
}

/// Whether `to` is reachable from `from` by following outgoing edges
pub fn reaches(from: &NodeId, to: &NodeId, edges: &[Edge]) -> bool {
    let adjacency = outgoing_index(edges);
    let mut visited: HashSet<&NodeId> = HashSet::new();
    let mut stack = vec![from];

    while let Some(current) = stack.pop() {
        if current == to {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(next) = adjacency.get(current) {
            stack.extend(next.iter().copied());
        }
    }

    false
}

/// An order in which every dependency precedes its dependents
///
/// Targets come before the sources that depend on them; ties keep node
/// order and a repeated id is listed once. Returns `None` if the edges
/// contain a cycle. Edges whose endpoints are not in `nodes` are ignored.
pub fn apply_order(nodes: &[Node], edges: &[Edge]) -> Option<Vec<NodeId>> {
    let mut known: HashSet<&NodeId> = HashSet::with_capacity(nodes.len());
    let unique: Vec<&NodeId> = nodes
        .iter()
        .map(|node| &node.id)
        .filter(|id| known.insert(*id))
        .collect();
    let mut pending: HashMap<&NodeId, usize> = unique.iter().map(|id| (*id, 0)).collect();
    let mut dependents: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();

    for edge in edges {
        if !known.contains(&edge.source) || !known.contains(&edge.target) {
            continue;
        }
        if let Some(count) = pending.get_mut(&edge.source) {
            *count += 1;
        }
        dependents.entry(&edge.target).or_default().push(&edge.source);
    }

    let mut ready: VecDeque<&NodeId> = unique
        .iter()
        .copied()
        .filter(|id| pending.get(id) == Some(&0))
        .collect();

    let mut order = Vec::with_capacity(unique.len());
    while let Some(id) = ready.pop_front() {
        order.push(id.clone());
        for dependent in dependents.get(id).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.push_back(*dependent);
                }
            }
        }
    }

    (order.len() == pending.len()).then_some(order)
}

fn outgoing_index(edges: &[Edge]) -> HashMap<&NodeId, Vec<&NodeId>> {
    let mut index: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
    for edge in edges {
        index.entry(&edge.source).or_default().push(&edge.target);
    }
    index
}
