use crate::{Context, NodeId, TenantId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ExecutionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

/// One run of a workflow definition against a specific input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub tenant: TenantId,
    pub status: ExecutionStatus,
    pub input: Context,
    pub output: Option<Context>,
    pub logs: Vec<ExecutionLogEntry>,
    pub nodes_executed: u32,
    pub tokens_used: u64,
    pub cost: f64,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
}

impl Execution {
    pub fn pending(workflow_id: WorkflowId, tenant: impl Into<TenantId>, input: Context) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            tenant: tenant.into(),
            status: ExecutionStatus::Pending,
            input,
            output: None,
            logs: Vec::new(),
            nodes_executed: 0,
            tokens_used: 0,
            cost: 0.0,
            error: None,
            started_at: Utc::now(),
            completed_at: None,
            duration_ms: None,
        }
    }

    /// Apply a store update. Fields left `None` in the patch are untouched.
    pub fn apply(&mut self, patch: ExecutionPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(output) = patch.output {
            self.output = Some(output);
        }
        if let Some(logs) = patch.logs {
            self.logs = logs;
        }
        if let Some(n) = patch.nodes_executed {
            self.nodes_executed = n;
        }
        if let Some(tokens) = patch.tokens_used {
            self.tokens_used = tokens;
        }
        if let Some(cost) = patch.cost {
            self.cost = cost;
        }
        if let Some(error) = patch.error {
            self.error = Some(error);
        }
        if let Some(at) = patch.completed_at {
            self.completed_at = Some(at);
        }
        if let Some(ms) = patch.duration_ms {
            self.duration_ms = Some(ms);
        }
    }

    pub fn entries_with_status(&self, status: ExecutionStatus) -> impl Iterator<Item = &ExecutionLogEntry> {
        self.logs.iter().filter(move |e| e.status == status)
    }
}

/// Partial update written once per state transition
#[derive(Debug, Clone, Default)]
pub struct ExecutionPatch {
    pub status: Option<ExecutionStatus>,
    pub output: Option<Context>,
    pub logs: Option<Vec<ExecutionLogEntry>>,
    pub nodes_executed: Option<u32>,
    pub tokens_used: Option<u64>,
    pub cost: Option<f64>,
    pub error: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
}

impl ExecutionPatch {
    pub fn status(status: ExecutionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub node_id: NodeId,
    pub node_name: String,
    pub status: ExecutionStatus,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Context>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionLogEntry {
    pub fn new(
        node_id: impl Into<NodeId>,
        node_name: impl Into<String>,
        status: ExecutionStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            node_name: node_name.into(),
            status,
            timestamp: Utc::now(),
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn with_data(mut self, data: Context) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
