//! Core abstractions for the automation engine
//!
//! Data model, error taxonomy, collaborator interfaces and execution events.
//! Nothing in this crate executes a workflow.

pub mod collaborators;
mod error;
pub mod events;
mod execution;
mod node;
mod team;
mod workflow;

pub use collaborators::{
    AgentRun, AgentRunner, Evaluator, IntegrationRequest, IntegrationRun, IntegrationRunner,
    PassThrough, TeamStore, WorkflowStore,
};
pub use error::{CollaboratorError, NodeError, TeamError, ValidationError, WorkflowError};
pub use events::{EventBus, EventEmitter, ExecutionEvent, NodeEvent};
pub use execution::{Execution, ExecutionId, ExecutionLogEntry, ExecutionPatch, ExecutionStatus};
pub use node::{NodeContext, NodeExecutor, NodeMetadata, NodeOutput};
pub use team::{
    AgentId, AgentMessage, Proposal, RolesConfig, Team, TeamConfiguration, TeamExecutionResult,
    TeamId, TeamMember, TeamStructure, VotingResults, LEADER_ROLE,
};
pub use workflow::{
    Context, Edge, NodeId, NodeSpec, NodeType, TenantId, WorkflowDefinition, WorkflowId,
};
