use thiserror::Error;

/// Error type returned by external collaborators (agent inference,
/// integrations, stores). The engine treats these as opaque.
pub type CollaboratorError = anyhow::Error;

/// Structural problems with a workflow graph. Always surfaced before an
/// execution is created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Workflow must contain at least one node")]
    EmptyGraph,

    #[error("Workflow must have a trigger node")]
    MissingTrigger,

    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error("Edge {from} -> {to} references an unknown node")]
    UnknownEdgeEndpoint { from: String, to: String },

    #[error("Workflow contains cycles")]
    CycleDetected,

    #[error("Trigger node {0} cannot have incoming edges")]
    TriggerHasIncomingEdge(String),
}

/// Failure of a single node executor. Aborts the containing execution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("Agent ID is required for AI Agent node")]
    MissingAgentId,

    #[error("Team ID is required for Agent Team node")]
    MissingTeamId,

    #[error("Integration ID is required for Integration node")]
    MissingIntegrationId,

    #[error("Organization ID is required for {0} execution")]
    MissingOrganization(String),

    #[error("Invalid value for '{field}': expected {expected}")]
    InvalidField { field: String, expected: String },

    #[error("AI Agent execution failed: {0}")]
    AgentFailed(String),

    #[error("Agent Team execution failed: {0}")]
    TeamFailed(String),

    #[error("Integration execution failed: {0}")]
    IntegrationFailed(String),

    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Timeout after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Cancelled")]
    Cancelled,

    #[error("Node panicked: {0}")]
    Panicked(String),
}

/// Team-level failures. Individual member failures never surface here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TeamError {
    #[error("Team not found: {0}")]
    TeamNotFound(String),

    #[error("No valid agents found in team {0}")]
    NoValidAgents(String),

    #[error("Team store error: {0}")]
    Store(String),
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("Workflow is not active: {0}")]
    WorkflowInactive(String),

    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(#[from] ValidationError),

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Execution not found: {0}")]
    ExecutionNotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Execution error: {0}")]
    Execution(String),
}
