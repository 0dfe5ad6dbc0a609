use crate::task_for;
use async_trait::async_trait;
use hubcore::{NodeContext, NodeError, NodeExecutor, NodeMetadata, NodeOutput, NodeSpec, TeamStructure};
use hubteams::TeamOrchestrator;
use serde_json::Value;
use std::sync::Arc;

/// Hands the task to a multi-agent team
pub struct TeamExecutor {
    teams: Arc<TeamOrchestrator>,
}

impl TeamExecutor {
    pub fn new(teams: Arc<TeamOrchestrator>) -> Self {
        Self { teams }
    }
}

fn pattern_override(node: &NodeSpec) -> Result<Option<TeamStructure>, NodeError> {
    let invalid = || NodeError::InvalidField {
        field: "patternOverride".to_string(),
        expected: "HIERARCHICAL, COLLABORATIVE, PIPELINE or DEMOCRATIC".to_string(),
    };

    match node.data.get("patternOverride") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s.parse::<TeamStructure>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// Error records left by members whose agent call failed
fn failed_calls(outputs: &Value) -> usize {
    match outputs {
        Value::Object(map) if map.get("type") == Some(&Value::from("error")) => 1,
        Value::Object(map) => map.values().map(failed_calls).sum(),
        Value::Array(items) => items.iter().map(failed_calls).sum(),
        _ => 0,
    }
}

#[async_trait]
impl NodeExecutor for TeamExecutor {
    async fn execute(&self, node: &NodeSpec, ctx: &NodeContext) -> Result<NodeOutput, NodeError> {
        let team_id = node.data_str("teamId").ok_or(NodeError::MissingTeamId)?;
        let organization = ctx.require_organization(node, "team")?;
        let pattern = pattern_override(node)?;
        let task = task_for(node, ctx);

        ctx.events.info(format!("Running team {}", team_id));

        let result = self
            .teams
            .execute_team_task(team_id, organization, &task, pattern)
            .await
            .map_err(|e| NodeError::TeamFailed(e.to_string()))?;

        ctx.events.info(format!(
            "Team {} finished as {} after {} messages",
            team_id,
            result.pattern,
            result.messages.len()
        ));
        let failed = failed_calls(&result.agent_outputs);
        if failed > 0 {
            ctx.events
                .warn(format!("Team {} had {} failed agent call(s)", team_id, failed));
        }

        Ok(NodeOutput::from_value(result.output).with_usage(result.total_tokens, result.total_cost))
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Runs a task across a team of agents".to_string(),
            category: "ai".to_string(),
        }
    }
}
