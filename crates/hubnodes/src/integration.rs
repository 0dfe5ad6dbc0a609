use async_trait::async_trait;
use hubcore::{
    IntegrationRequest, IntegrationRunner, NodeContext, NodeError, NodeExecutor, NodeMetadata,
    NodeOutput, NodeSpec,
};
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_ACTION: &str = "execute";

/// Calls a third-party integration; never reports token usage
pub struct IntegrationExecutor {
    integrations: Arc<dyn IntegrationRunner>,
}

impl IntegrationExecutor {
    pub fn new(integrations: Arc<dyn IntegrationRunner>) -> Self {
        Self { integrations }
    }
}

#[async_trait]
impl NodeExecutor for IntegrationExecutor {
    async fn execute(&self, node: &NodeSpec, ctx: &NodeContext) -> Result<NodeOutput, NodeError> {
        let integration_id = node
            .data_str("integrationId")
            .ok_or(NodeError::MissingIntegrationId)?;
        let organization = ctx.require_organization(node, "integration")?;

        let request = IntegrationRequest {
            integration_id: integration_id.to_string(),
            action: node.data_str("action").unwrap_or(DEFAULT_ACTION).to_string(),
            params: node
                .data
                .get("params")
                .cloned()
                .unwrap_or_else(|| Value::Object(ctx.data.clone())),
            tenant: organization.to_string(),
        };
        tracing::debug!(
            "Node {} calling integration {} ({})",
            node.id,
            request.integration_id,
            request.action
        );

        let run = self
            .integrations
            .run_integration(request)
            .await
            .map_err(|e| NodeError::IntegrationFailed(e.to_string()))?;

        Ok(NodeOutput::from_value(run.output))
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Calls an external integration action".to_string(),
            category: "integration".to_string(),
        }
    }
}
