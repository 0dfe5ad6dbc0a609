use hubcore::{NodeContext, NodeError, NodeExecutor, NodeMetadata, NodeOutput, NodeSpec, NodeType};
use std::sync::Arc;

/// One executor per node type. Every field is required, so a registry can
/// never be built with a node type left unhandled.
#[derive(Clone)]
pub struct NodeHandlers {
    pub trigger: Arc<dyn NodeExecutor>,
    pub ai_agent: Arc<dyn NodeExecutor>,
    pub agent_team: Arc<dyn NodeExecutor>,
    pub integration: Arc<dyn NodeExecutor>,
    pub condition: Arc<dyn NodeExecutor>,
    pub transform: Arc<dyn NodeExecutor>,
}

/// Maps a node's declared type to its executor
pub struct NodeExecutorRegistry {
    handlers: NodeHandlers,
}

impl NodeExecutorRegistry {
    pub fn new(handlers: NodeHandlers) -> Self {
        let registry = Self { handlers };
        for node_type in NodeType::ALL {
            tracing::debug!(
                "Registered node type: {} ({})",
                node_type,
                registry.get_metadata(node_type).category
            );
        }
        registry
    }

    /// Swap the executor for one node type
    pub fn with_executor(mut self, node_type: NodeType, executor: Arc<dyn NodeExecutor>) -> Self {
        let slot = match node_type {
            NodeType::Trigger => &mut self.handlers.trigger,
            NodeType::AiAgent => &mut self.handlers.ai_agent,
            NodeType::AgentTeam => &mut self.handlers.agent_team,
            NodeType::Integration => &mut self.handlers.integration,
            NodeType::Condition => &mut self.handlers.condition,
            NodeType::Transform => &mut self.handlers.transform,
        };
        *slot = executor;
        self
    }

    pub fn executor_for(&self, node_type: NodeType) -> &dyn NodeExecutor {
        let executor = match node_type {
            NodeType::Trigger => &self.handlers.trigger,
            NodeType::AiAgent => &self.handlers.ai_agent,
            NodeType::AgentTeam => &self.handlers.agent_team,
            NodeType::Integration => &self.handlers.integration,
            NodeType::Condition => &self.handlers.condition,
            NodeType::Transform => &self.handlers.transform,
        };
        executor.as_ref()
    }

    /// Dispatch on `node.node_type`. Errors are returned untouched.
    pub async fn execute(&self, node: &NodeSpec, ctx: &NodeContext) -> Result<NodeOutput, NodeError> {
        self.executor_for(node.node_type).execute(node, ctx).await
    }

    pub fn list_node_types(&self) -> Vec<NodeType> {
        NodeType::ALL.to_vec()
    }

    pub fn get_metadata(&self, node_type: NodeType) -> NodeMetadata {
        self.executor_for(node_type).metadata()
    }
}
