//! Resource nodes placed on the infrastructure canvas

use super::engine::InfraError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a node
///
/// Serializes as a plain string. Fresh ids are UUIDs; imported documents may
/// carry any string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new random NodeId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a NodeId from an existing string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The closed set of resource kinds a node can represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    /// Network container (VPC)
    #[serde(rename = "aws_vpc")]
    Vpc,
    /// Subnet inside a network container
    #[serde(rename = "aws_subnet")]
    Subnet,
    /// Compute instance
    #[serde(rename = "aws_instance")]
    Instance,
    /// Managed database
    #[serde(rename = "aws_rds")]
    Database,
    /// Load balancer
    #[serde(rename = "aws_elb")]
    LoadBalancer,
    /// Object store bucket
    #[serde(rename = "aws_s3_bucket")]
    ObjectStore,
    /// Access role
    #[serde(rename = "aws_iam_role")]
    AccessRole,
}

impl ResourceType {
    /// Every resource type, in palette order
    pub const ALL: [ResourceType; 7] = [
        ResourceType::Vpc,
        ResourceType::Subnet,
        ResourceType::LoadBalancer,
        ResourceType::Instance,
        ResourceType::Database,
        ResourceType::ObjectStore,
        ResourceType::AccessRole,
    ];

    /// The serialized tag (e.g. `aws_vpc`)
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceType::Vpc => "aws_vpc",
            ResourceType::Subnet => "aws_subnet",
            ResourceType::Instance => "aws_instance",
            ResourceType::Database => "aws_rds",
            ResourceType::LoadBalancer => "aws_elb",
            ResourceType::ObjectStore => "aws_s3_bucket",
            ResourceType::AccessRole => "aws_iam_role",
        }
    }

    /// Human-readable label
    pub const fn display_name(self) -> &'static str {
        match self {
            ResourceType::Vpc => "VPC",
            ResourceType::Subnet => "Subnet",
            ResourceType::Instance => "EC2 Instance",
            ResourceType::Database => "RDS Database",
            ResourceType::LoadBalancer => "Load Balancer",
            ResourceType::ObjectStore => "S3 Bucket",
            ResourceType::AccessRole => "IAM Role",
        }
    }

    /// Global resources live outside any network container
    pub const fn is_global(self) -> bool {
        matches!(self, ResourceType::ObjectStore | ResourceType::AccessRole)
    }

    /// Whether a node of this type may sit at root level (no parent)
    pub const fn may_be_root(self) -> bool {
        self.is_global() || matches!(self, ResourceType::Vpc)
    }

    /// Types a node of this type may directly contain
    pub const fn allowed_children(self) -> &'static [ResourceType] {
        match self {
            ResourceType::Vpc => &[ResourceType::Subnet, ResourceType::LoadBalancer],
            ResourceType::Subnet => &[ResourceType::Instance, ResourceType::Database],
            _ => &[],
        }
    }

    /// Whether `child` may be placed directly inside a node of this type
    pub fn can_contain(self, child: ResourceType) -> bool {
        self.allowed_children().contains(&child)
    }

    /// Default display name for a freshly created node
    pub fn default_name(self) -> String {
        let tag = self.as_str();
        let tag = tag.strip_prefix("aws_").unwrap_or(tag);
        tag.replacen('_', " ", 1)
    }

    /// Default configuration parameters for a freshly created node
    pub fn default_params(self, name: &str) -> Params {
        let entries: Vec<(&str, PropertyValue)> = match self {
            ResourceType::Vpc => vec![
                ("cidr_block", "10.0.0.0/16".into()),
                ("enable_dns_hostnames", true.into()),
                ("enable_dns_support", true.into()),
            ],
            ResourceType::Subnet => vec![
                ("subnet_type", "public".into()),
                ("cidr_block", "10.0.1.0/24".into()),
                ("availability_zone", "us-west-2a".into()),
            ],
            ResourceType::Instance => vec![
                ("ami", "ami-0c02fb55956c7d316".into()),
                ("instance_type", "t2.micro".into()),
                ("key_name", "my-key-pair".into()),
            ],
            ResourceType::Database => vec![
                ("engine", "mysql".into()),
                ("instance_class", "db.t3.micro".into()),
                ("allocated_storage", PropertyValue::Int(20)),
            ],
            ResourceType::LoadBalancer => vec![
                ("load_balancer_type", "application".into()),
                ("scheme", "internet-facing".into()),
            ],
            ResourceType::AccessRole => vec![(
                "assume_role_policy",
                r#"{"Version":"2012-10-17","Statement":[]}"#.into(),
            )],
            ResourceType::ObjectStore => vec![
                ("bucket_name", bucket_name(name).into()),
                ("versioning", false.into()),
            ],
        };

        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }
}

/// Bucket names get a random suffix so two fresh buckets never collide
fn bucket_name(name: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("{}-{}", name.to_lowercase().replace(' ', "-"), suffix)
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = InfraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s || t.as_str().strip_prefix("aws_") == Some(s))
            .ok_or_else(|| InfraError::UnknownResourceType(s.to_string()))
    }
}

/// Typed property values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`
    UInt(u64),
    Float(f64),
    String(String),
    Array(Vec<PropertyValue>),
    Object(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Int(n)
    }
}

/// Resource configuration parameters
pub type Params = BTreeMap<String, PropertyValue>;

/// Canvas coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// This position shifted by the given deltas
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Resource-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Display name
    pub name: String,
    /// Resource parameters; shape depends on the node type
    #[serde(default)]
    pub params: Params,
}

impl NodeData {
    /// Default data for a resource type
    pub fn defaults_for(resource_type: ResourceType) -> Self {
        let name = resource_type.default_name();
        let params = resource_type.default_params(&name);
        Self { name, params }
    }
}

/// Deployment status tracked per node at runtime (never exported)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    NotApplied,
    Creating,
    Created,
    Failed,
}

/// A resource placed on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// Resource kind
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Containing node, `None` at root level
    #[serde(default)]
    pub parent: Option<NodeId>,
    /// Directly contained nodes, in insertion order
    #[serde(default)]
    pub children: Vec<NodeId>,
    /// Name and parameters
    pub data: NodeData,
    /// Canvas position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Node {
    /// Create a root-level node with a fresh id and default data
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            id: NodeId::new(),
            resource_type,
            parent: None,
            children: Vec::new(),
            data: NodeData::defaults_for(resource_type),
            position: None,
        }
    }

    /// Set the parent reference (does not touch the parent's children)
    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the canvas position
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.data.name = name.into();
        self
    }

    /// Set a single parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.data.params.insert(key.into(), value.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
