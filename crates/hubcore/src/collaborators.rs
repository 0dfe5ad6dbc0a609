//! Narrow interfaces to the systems the engine does not own.
//!
//! Storage, single-agent inference and integrations live elsewhere; the
//! engine only ever sees them through these traits.

use crate::{
    CollaboratorError, Context, Execution, ExecutionId, ExecutionPatch, NodeError,
    NodeType, Team, TenantId, WorkflowDefinition, WorkflowError, WorkflowId,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Persistence for workflow definitions and their executions
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Look up a definition owned by `tenant`, active or not
    async fn find_active_definition(
        &self,
        id: WorkflowId,
        tenant: &str,
    ) -> Result<Option<WorkflowDefinition>, WorkflowError>;

    async fn create_execution(
        &self,
        definition: &WorkflowDefinition,
        input: Context,
    ) -> Result<Execution, WorkflowError>;

    async fn update_execution(
        &self,
        id: ExecutionId,
        patch: ExecutionPatch,
    ) -> Result<(), WorkflowError>;

    /// Bump the execution counter and last-executed timestamp
    async fn increment_definition_stats(&self, id: WorkflowId) -> Result<(), WorkflowError>;

    async fn get_execution(&self, id: ExecutionId) -> Result<Option<Execution>, WorkflowError>;
}

/// Result of one single-agent inference call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRun {
    pub output: serde_json::Value,
    pub tokens_used: u64,
    pub cost: f64,
}

impl AgentRun {
    /// Text reply in the `{"content": ...}` shape inference providers return
    pub fn content(text: impl Into<String>, tokens_used: u64, cost: f64) -> Self {
        Self {
            output: serde_json::json!({ "content": text.into() }),
            tokens_used,
            cost,
        }
    }
}

#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run_agent(
        &self,
        agent_id: &str,
        tenant: &str,
        task: &str,
        context: &Context,
    ) -> Result<AgentRun, CollaboratorError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationRequest {
    pub integration_id: String,
    pub action: String,
    pub params: serde_json::Value,
    pub tenant: TenantId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationRun {
    pub output: serde_json::Value,
}

#[async_trait]
pub trait IntegrationRunner: Send + Sync {
    async fn run_integration(
        &self,
        request: IntegrationRequest,
    ) -> Result<IntegrationRun, CollaboratorError>;
}

/// Pluggable semantics for `condition` and `transform` nodes
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        kind: NodeType,
        data: &Context,
        context: &Context,
    ) -> Result<Context, NodeError>;
}

/// Reference evaluator: returns the context unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

#[async_trait]
impl Evaluator for PassThrough {
    async fn evaluate(
        &self,
        _kind: NodeType,
        _data: &Context,
        context: &Context,
    ) -> Result<Context, NodeError> {
        Ok(context.clone())
    }
}

#[async_trait]
pub trait TeamStore: Send + Sync {
    async fn find_team(&self, team_id: &str, tenant: &str) -> Result<Option<Team>, CollaboratorError>;
}

