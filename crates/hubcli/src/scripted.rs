//! Collaborators answered from a JSON script, for running workflows locally

use anyhow::{anyhow, Context as _};
use async_trait::async_trait;
use hubcore::{
    AgentRun, AgentRunner, CollaboratorError, Context, IntegrationRequest, IntegrationRun,
    IntegrationRunner, Team,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;

/// Canned replies keyed by agent and integration id
#[derive(Debug, Default, Deserialize)]
pub struct AgentScript {
    #[serde(default)]
    pub agents: HashMap<String, ScriptedReply>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub integrations: HashMap<String, Value>,
}

impl AgentScript {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading agent script {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing agent script {}", path.display()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScriptedReply {
    /// Plain text, returned as `{"content": ...}`
    Text(String),
    Failure {
        error: String,
    },
    Run {
        output: Value,
        #[serde(default, rename = "tokensUsed")]
        tokens_used: u64,
        #[serde(default)]
        cost: f64,
    },
}

/// Agents from the script; unknown agents echo their task
pub struct ScriptedAgents {
    replies: HashMap<String, ScriptedReply>,
}

impl ScriptedAgents {
    pub fn new(replies: HashMap<String, ScriptedReply>) -> Self {
        Self { replies }
    }
}

#[async_trait]
impl AgentRunner for ScriptedAgents {
    async fn run_agent(
        &self,
        agent_id: &str,
        _tenant: &str,
        task: &str,
        _context: &Context,
    ) -> Result<AgentRun, CollaboratorError> {
        tracing::debug!("Scripted agent {} received {} bytes", agent_id, task.len());

        match self.replies.get(agent_id) {
            Some(ScriptedReply::Text(text)) => Ok(AgentRun::content(text.clone(), 0, 0.0)),
            Some(ScriptedReply::Failure { error }) => Err(anyhow!(error.clone())),
            Some(ScriptedReply::Run {
                output,
                tokens_used,
                cost,
            }) => Ok(AgentRun {
                output: output.clone(),
                tokens_used: *tokens_used,
                cost: *cost,
            }),
            None => Ok(AgentRun::content(
                format!("[{}] {}", agent_id, task),
                task.split_whitespace().count() as u64,
                0.0,
            )),
        }
    }
}

/// Integrations from the script; unknown ones echo the request
pub struct ScriptedIntegrations {
    outputs: HashMap<String, Value>,
}

impl ScriptedIntegrations {
    pub fn new(outputs: HashMap<String, Value>) -> Self {
        Self { outputs }
    }
}

#[async_trait]
impl IntegrationRunner for ScriptedIntegrations {
    async fn run_integration(
        &self,
        request: IntegrationRequest,
    ) -> Result<IntegrationRun, CollaboratorError> {
        let output = match self.outputs.get(&request.integration_id) {
            Some(output) => output.clone(),
            None => json!({
                "integration": request.integration_id,
                "action": request.action,
                "params": request.params,
            }),
        };
        Ok(IntegrationRun { output })
    }
}
