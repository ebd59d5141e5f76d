//! Serialization tests with document-format fixtures

use serde_json::{json, Value};

/// Fixture: a subnet node as the canvas exports it
fn document_node_fixture() -> Value {
    json!({
        "id": "subnet-a",
        "type": "aws_subnet",
        "parent": "vpc-main",
        "children": ["web-1"],
        "data": {
            "name": "public a",
            "params": {
                "subnet_type": "public",
                "cidr_block": "10.0.1.0/24",
                "availability_zone": "us-west-2a"
            }
        },
        "position": { "x": 120.0, "y": 80.5 }
    })
}

/// Fixture: a dependency edge
fn document_edge_fixture() -> Value {
    json!({
        "id": "edge-web-db",
        "source": "web-1",
        "target": "db-1",
        "type": "dependency"
    })
}

/// Fixture: a small consistent graph
fn document_fixture() -> Value {
    json!({
        "nodes": [
            {
                "id": "vpc-main",
                "type": "aws_vpc",
                "parent": null,
                "children": ["subnet-a"],
                "data": { "name": "main", "params": { "cidr_block": "10.0.0.0/16" } },
                "position": { "x": 0.0, "y": 0.0 }
            },
            document_node_fixture(),
            {
                "id": "web-1",
                "type": "aws_instance",
                "parent": "subnet-a",
                "children": [],
                "data": { "name": "web", "params": { "instance_type": "t3.small", "tags": { "tier": "web" } } }
            },
            {
                "id": "db-1",
                "type": "aws_s3_bucket",
                "parent": null,
                "children": [],
                "data": { "name": "assets", "params": { "versioning": true } }
            }
        ],
        "edges": [document_edge_fixture()]
    })
}

#[cfg(test)]
mod serialization_tests {
    use super::*;
    use crate::graph::{
        document::GraphDocument,
        edge::{Edge, EdgeKind},
        node::{Node, NodeId, NodeStatus, Position, PropertyValue, ResourceType},
    };

    #[test]
    fn node_id_serializes_as_string() {
        let id = NodeId::from_string("vpc-main");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"vpc-main\"");
    }

    #[test]
    fn resource_type_uses_provider_tags() {
        let json = serde_json::to_string(&ResourceType::Database).unwrap();
        assert_eq!(json, "\"aws_rds\"");

        let rt: ResourceType = serde_json::from_str("\"aws_iam_role\"").unwrap();
        assert_eq!(rt, ResourceType::AccessRole);

        assert!(serde_json::from_str::<ResourceType>("\"aws_lambda\"").is_err());
    }

    #[test]
    fn node_status_serializes_snake_case() {
        let json = serde_json::to_string(&NodeStatus::NotApplied).unwrap();
        assert_eq!(json, "\"not_applied\"");
    }

    #[test]
    fn can_deserialize_node_fixture() {
        let result: Result<Node, _> = serde_json::from_value(document_node_fixture());
        assert!(result.is_ok(), "Failed to deserialize node fixture: {:?}", result.err());

        let node = result.unwrap();
        assert_eq!(node.id.as_str(), "subnet-a");
        assert_eq!(node.resource_type, ResourceType::Subnet);
        assert_eq!(node.parent, Some(NodeId::from("vpc-main")));
        assert_eq!(node.children, vec![NodeId::from("web-1")]);
        assert_eq!(node.data.name, "public a");
        assert_eq!(node.data.params["subnet_type"], PropertyValue::from("public"));
        assert_eq!(node.position, Some(Position::new(120.0, 80.5)));
    }

    #[test]
    fn can_deserialize_edge_fixture() {
        let edge: Edge = serde_json::from_value(document_edge_fixture()).unwrap();
        assert_eq!(edge.id.as_str(), "edge-web-db");
        assert_eq!(edge.source.as_str(), "web-1");
        assert_eq!(edge.target.as_str(), "db-1");
        assert_eq!(edge.kind, EdgeKind::Dependency);
    }

    #[test]
    fn edge_type_defaults_to_dependency() {
        let edge: Edge = serde_json::from_value(json!({
            "id": "e", "source": "a", "target": "b"
        }))
        .unwrap();
        assert_eq!(edge.kind, EdgeKind::Dependency);
    }

    #[test]
    fn node_without_optional_fields_deserializes() {
        let node: Node = serde_json::from_value(json!({
            "id": "role",
            "type": "aws_iam_role",
            "data": { "name": "deployer" }
        }))
        .unwrap();
        assert!(node.is_root());
        assert!(node.children.is_empty());
        assert!(node.data.params.is_empty());
        assert!(node.position.is_none());
    }

    #[test]
    fn nested_params_keep_their_shape() {
        let doc: GraphDocument = serde_json::from_value(document_fixture()).unwrap();
        let web = doc.nodes.iter().find(|n| n.id.as_str() == "web-1").unwrap();
        match &web.data.params["tags"] {
            PropertyValue::Object(tags) => assert_eq!(tags["tier"], PropertyValue::from("web")),
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn document_fixture_is_consistent() {
        let doc: GraphDocument = serde_json::from_value(document_fixture()).unwrap();
        assert_eq!(doc.nodes.len(), 4);
        assert_eq!(doc.edges.len(), 1);
        assert!(doc.violations().is_empty(), "{:?}", doc.violations());
    }

    #[test]
    fn document_round_trips_through_json() {
        let doc: GraphDocument = serde_json::from_value(document_fixture()).unwrap();
        let json = doc.to_json_pretty().unwrap();
        let again = GraphDocument::from_json(&json).unwrap();
        assert_eq!(doc, again);
    }

    #[test]
    fn serialized_node_has_document_structure() {
        let node = Node::new(ResourceType::Vpc).at(Position::new(1.0, 2.0));
        let json = serde_json::to_value(&node).unwrap();

        assert!(json["id"].is_string());
        assert_eq!(json["type"], "aws_vpc");
        assert!(json["parent"].is_null());
        assert!(json["children"].is_array());
        assert_eq!(json["data"]["name"], "vpc");
        assert_eq!(json["data"]["params"]["enable_dns_hostnames"], true);
        assert_eq!(json["position"]["x"], 1.0);
        assert!(json.get("resource_type").is_none());
    }

    #[test]
    fn serialized_edge_has_document_structure() {
        let edge = Edge::dependency(NodeId::from("a"), NodeId::from("b"));
        let json = serde_json::to_value(&edge).unwrap();

        assert!(json["id"].is_string());
        assert_eq!(json["source"], "a");
        assert_eq!(json["target"], "b");
        assert_eq!(json["type"], "dependency");
        assert!(json.get("kind").is_none());
    }
}
