use crate::{context_for, task_for};
use async_trait::async_trait;
use hubcore::{AgentRunner, NodeContext, NodeError, NodeExecutor, NodeMetadata, NodeOutput, NodeSpec};
use std::sync::Arc;

/// Runs a single agent through the inference collaborator
pub struct AgentExecutor {
    agents: Arc<dyn AgentRunner>,
}

impl AgentExecutor {
    pub fn new(agents: Arc<dyn AgentRunner>) -> Self {
        Self { agents }
    }
}

#[async_trait]
impl NodeExecutor for AgentExecutor {
    async fn execute(&self, node: &NodeSpec, ctx: &NodeContext) -> Result<NodeOutput, NodeError> {
        let agent_id = node.data_str("agentId").ok_or(NodeError::MissingAgentId)?;
        let organization = ctx.require_organization(node, "agent")?;

        let task = task_for(node, ctx);
        let context = context_for(node, ctx);

        tracing::debug!("Node {} running agent {} for {}", node.id, agent_id, organization);
        ctx.events.info(format!("Running agent {}", agent_id));

        let run = self
            .agents
            .run_agent(agent_id, organization, &task, &context)
            .await
            .map_err(|e| NodeError::AgentFailed(e.to_string()))?;

        Ok(NodeOutput::from_value(run.output).with_usage(run.tokens_used, run.cost))
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Runs one AI agent on a task".to_string(),
            category: "ai".to_string(),
        }
    }
}
