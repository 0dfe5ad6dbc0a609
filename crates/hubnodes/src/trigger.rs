use async_trait::async_trait;
use hubcore::{NodeContext, NodeError, NodeExecutor, NodeMetadata, NodeOutput, NodeSpec};

/// Entry point of a workflow; passes the input through untouched
pub struct TriggerExecutor;

#[async_trait]
impl NodeExecutor for TriggerExecutor {
    async fn execute(&self, _node: &NodeSpec, ctx: &NodeContext) -> Result<NodeOutput, NodeError> {
        Ok(NodeOutput::new(ctx.data.clone()))
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Starts the workflow with the invocation input".to_string(),
            category: "trigger".to_string(),
        }
    }
}
