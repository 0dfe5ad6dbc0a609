use crate::{events::EventBus, Context, EventEmitter, ExecutionId, NodeError, NodeSpec, TenantId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Executes one kind of workflow node.
///
/// Implementations must not swallow failures: any error is returned to the
/// execution runner, which records it and fails the whole execution.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Run `node` against the context accumulated so far
    async fn execute(&self, node: &NodeSpec, ctx: &NodeContext) -> Result<NodeOutput, NodeError>;

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::default()
    }
}

/// Everything an executor can see while running one node
#[derive(Clone)]
pub struct NodeContext {
    pub execution_id: ExecutionId,

    /// Tenant owning the execution. Nodes may override it with `organizationId`.
    pub tenant: Option<TenantId>,

    /// Accumulated outputs of all nodes executed so far
    pub data: Context,

    pub events: EventEmitter,
}

impl NodeContext {
    pub fn new(
        execution_id: ExecutionId,
        tenant: Option<TenantId>,
        data: Context,
        events: EventEmitter,
    ) -> Self {
        Self {
            execution_id,
            tenant,
            data,
            events,
        }
    }

    /// Context whose events go nowhere; for running a single executor in isolation
    pub fn detached(tenant: Option<TenantId>, data: Context) -> Self {
        let execution_id = Uuid::new_v4();
        let bus = EventBus::new(1);
        Self::new(
            execution_id,
            tenant,
            data,
            bus.create_emitter(execution_id, String::new()),
        )
    }

    /// The organization a node runs under: `data.organizationId`, else the tenant
    pub fn organization<'a>(&'a self, node: &'a NodeSpec) -> Option<&'a str> {
        node.data_str("organizationId").or(self.tenant.as_deref())
    }

    pub fn require_organization<'a>(
        &'a self,
        node: &'a NodeSpec,
        purpose: &str,
    ) -> Result<&'a str, NodeError> {
        self.organization(node)
            .ok_or_else(|| NodeError::MissingOrganization(purpose.to_string()))
    }

    /// The context serialized as a task prompt
    pub fn serialized(&self) -> String {
        serde_json::Value::Object(self.data.clone()).to_string()
    }
}

/// Output fragment plus usage metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeOutput {
    pub output: Context,
    pub tokens_used: u64,
    pub cost: f64,
}

impl NodeOutput {
    pub fn new(output: Context) -> Self {
        Self {
            output,
            tokens_used: 0,
            cost: 0.0,
        }
    }

    pub fn with_usage(mut self, tokens_used: u64, cost: f64) -> Self {
        self.tokens_used = tokens_used;
        self.cost = cost;
        self
    }

    /// Wrap an arbitrary collaborator payload as a mergeable fragment.
    /// Objects merge key by key; anything else lands under `output`.
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => Self::new(map),
            other => {
                let mut map = Context::new();
                map.insert("output".to_string(), other);
                Self::new(map)
            }
        }
    }
}

/// Describes a node type for listings
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub description: String,
    pub category: String,
}

impl Default for NodeMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            category: "general".to_string(),
        }
    }
}
