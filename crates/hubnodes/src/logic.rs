use async_trait::async_trait;
use hubcore::{Evaluator, NodeContext, NodeError, NodeExecutor, NodeMetadata, NodeOutput, NodeSpec, NodeType};
use std::sync::Arc;

/// `condition` and `transform` nodes, both delegated to an [`Evaluator`]
pub struct EvaluatorExecutor {
    kind: NodeType,
    evaluator: Arc<dyn Evaluator>,
}

impl EvaluatorExecutor {
    pub fn condition(evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            kind: NodeType::Condition,
            evaluator,
        }
    }

    pub fn transform(evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            kind: NodeType::Transform,
            evaluator,
        }
    }
}

#[async_trait]
impl NodeExecutor for EvaluatorExecutor {
    async fn execute(&self, node: &NodeSpec, ctx: &NodeContext) -> Result<NodeOutput, NodeError> {
        let output = self.evaluator.evaluate(self.kind, &node.data, &ctx.data).await?;
        Ok(NodeOutput::new(output))
    }

    fn metadata(&self) -> NodeMetadata {
        let description = match self.kind {
            NodeType::Condition => "Evaluates a condition over the context",
            _ => "Reshapes the context",
        };
        NodeMetadata {
            description: description.to_string(),
            category: "logic".to_string(),
        }
    }
}
