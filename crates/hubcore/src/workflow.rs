use crate::WorkflowError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type WorkflowId = Uuid;
pub type NodeId = String;
pub type TenantId = String;

/// Key/value data accumulated between nodes during one execution
pub type Context = serde_json::Map<String, serde_json::Value>;

/// Stored automation workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default = "Uuid::new_v4")]
    pub id: WorkflowId,
    #[serde(default)]
    pub tenant: TenantId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub variables: Context,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub execution_count: u64,
    #[serde(default)]
    pub last_executed: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>, tenant: impl Into<TenantId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant: tenant.into(),
            name: name.into(),
            description: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            variables: Context::new(),
            is_active: true,
            execution_count: 0,
            last_executed: None,
        }
    }

    pub fn add_node(&mut self, node: NodeSpec) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    pub fn connect(&mut self, source: impl Into<NodeId>, target: impl Into<NodeId>) {
        self.edges.push(Edge::new(source, target));
    }
}

/// The closed set of node kinds a workflow can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NodeType {
    Trigger,
    AiAgent,
    AgentTeam,
    Integration,
    Condition,
    Transform,
}

impl NodeType {
    pub const ALL: [NodeType; 6] = [
        NodeType::Trigger,
        NodeType::AiAgent,
        NodeType::AgentTeam,
        NodeType::Integration,
        NodeType::Condition,
        NodeType::Transform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Trigger => "trigger",
            NodeType::AiAgent => "aiAgent",
            NodeType::AgentTeam => "agentTeam",
            NodeType::Integration => "integration",
            NodeType::Condition => "condition",
            NodeType::Transform => "transform",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for NodeType {
    type Error = WorkflowError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or(WorkflowError::UnknownNodeType(tag))
    }
}

impl From<NodeType> for String {
    fn from(t: NodeType) -> Self {
        t.as_str().to_string()
    }
}

/// Node specification in a workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub data: Context,
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeId>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            data: Context::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        self.with_data("label", label.into())
    }

    /// Editor label, if the node has one
    pub fn label(&self) -> Option<&str> {
        self.data_str("label")
    }

    /// Name recorded in execution logs
    pub fn display_name(&self) -> String {
        self.label().unwrap_or("Unnamed Node").to_string()
    }

    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    pub fn is_trigger(&self) -> bool {
        self.node_type == NodeType::Trigger
    }
}

/// "target consumes source's output"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
        }
    }
}
