//! Find queries for locating resource nodes

use super::types::QueryResult;
use crate::graph::{InfraStore, Node, NodeId, PropertyValue, ResourceType};

/// Query for finding nodes by various criteria
///
/// Results keep store insertion order.
#[derive(Debug, Clone, Default)]
pub struct FindQuery {
    /// Case-insensitive substring over id, type tag and name
    pub text: Option<String>,
    /// Filter by resource type
    pub resource_type: Option<ResourceType>,
    /// Filter by direct container
    pub parent: Option<NodeId>,
    /// Only root-level nodes
    pub root_only: bool,
    /// Filter by parameter key existence
    pub has_param: Option<String>,
    /// Filter by parameter key-value match
    pub param_equals: Option<(String, PropertyValue)>,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Number of results to skip
    pub offset: Option<usize>,
}

impl FindQuery {
    /// Create a new empty query (matches all nodes)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = Some(resource_type);
        self
    }

    pub fn within(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn roots(mut self) -> Self {
        self.root_only = true;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>) -> Self {
        self.has_param = Some(key.into());
        self
    }

    pub fn with_param_value(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.param_equals = Some((key.into(), value));
        self
    }

    /// Limit results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip results (for pagination)
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Execute the query against a store
    pub fn execute(&self, store: &InfraStore) -> QueryResult {
        self.execute_on(store.nodes())
    }

    /// Execute the query against a node slice
    pub fn execute_on(&self, nodes: &[Node]) -> QueryResult {
        let needle = self
            .text
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());

        let matching: Vec<&Node> = nodes
            .iter()
            .filter(|node| self.matches(node, needle.as_deref()))
            .collect();
        let total_count = matching.len();

        let nodes = matching
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        QueryResult { nodes, total_count }
    }

    /// Check if a node matches all query criteria
    fn matches(&self, node: &Node, needle: Option<&str>) -> bool {
        if let Some(needle) = needle {
            let hit = node.id.as_str().to_lowercase().contains(needle)
                || node.resource_type.as_str().contains(needle)
                || node.data.name.to_lowercase().contains(needle);
            if !hit {
                return false;
            }
        }

        if let Some(expected) = self.resource_type {
            if node.resource_type != expected {
                return false;
            }
        }

        if let Some(ref parent) = self.parent {
            if node.parent.as_ref() != Some(parent) {
                return false;
            }
        }

        if self.root_only && !node.is_root() {
            return false;
        }

        if let Some(ref key) = self.has_param {
            if !node.data.params.contains_key(key) {
                return false;
            }
        }

        if let Some((ref key, ref expected_value)) = self.param_equals {
            match node.data.params.get(key) {
                Some(value) if value == expected_value => {}
                _ => return false,
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeUpdate;

    fn create_test_store() -> (InfraStore, NodeId) {
        let mut store = InfraStore::new();
        let vpc = store.add_node(ResourceType::Vpc, None, None);
        let public = store.add_node(ResourceType::Subnet, None, Some(&vpc));
        let private = store.add_node(ResourceType::Subnet, None, Some(&vpc));
        store.add_node(ResourceType::Instance, None, Some(&public));
        store.add_node(ResourceType::ObjectStore, None, None);

        let mut params = store.node(&private).unwrap().data.params.clone();
        params.insert("subnet_type".into(), "private".into());
        store.update_node(&private, NodeUpdate::new().name("Private Tier").params(params));

        (store, vpc)
    }

    #[test]
    fn test_find_all() {
        let (store, _) = create_test_store();
        let result = FindQuery::new().execute(&store);
        assert_eq!(result.nodes.len(), 5);
        assert_eq!(result.total_count, 5);
    }

    #[test]
    fn test_find_by_resource_type() {
        let (store, _) = create_test_store();
        let result = FindQuery::new()
            .with_resource_type(ResourceType::Subnet)
            .execute(&store);
        assert_eq!(result.nodes.len(), 2);
    }

    #[test]
    fn test_find_by_text() {
        let (store, _) = create_test_store();
        let result = FindQuery::new().with_text("private TIER").execute(&store);
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].data.name, "Private Tier");

        let result = FindQuery::new().with_text("  ").execute(&store);
        assert_eq!(result.total_count, 5);
    }

    #[test]
    fn test_find_by_param_value() {
        let (store, _) = create_test_store();
        let result = FindQuery::new()
            .with_param_value("subnet_type", PropertyValue::from("public"))
            .execute(&store);
        assert_eq!(result.nodes.len(), 1);

        let result = FindQuery::new().with_param("bucket_name").execute(&store);
        assert_eq!(result.nodes.len(), 1);
    }

    #[test]
    fn test_find_within_parent_and_roots() {
        let (store, vpc) = create_test_store();
        assert_eq!(FindQuery::new().within(vpc).execute(&store).total_count, 2);
        assert_eq!(FindQuery::new().roots().execute(&store).total_count, 2);
    }

    #[test]
    fn test_find_with_offset_and_limit() {
        let (store, _) = create_test_store();
        let all = FindQuery::new().execute(&store);
        let result = FindQuery::new().offset(1).limit(2).execute(&store);
        assert_eq!(result.nodes.len(), 2);
        assert_eq!(result.total_count, 5);
        assert_eq!(result.ids(), all.ids()[1..3].to_vec());

        let result = FindQuery::new().offset(10).execute(&store);
        assert!(result.nodes.is_empty());
    }
}
