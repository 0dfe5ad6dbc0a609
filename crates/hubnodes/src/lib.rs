//! Standard node library
//!
//! One executor per node type, wired to the collaborators a host provides.

mod agent;
mod integration;
mod logic;
mod team;
mod trigger;

pub use agent::AgentExecutor;
pub use integration::IntegrationExecutor;
pub use logic::EvaluatorExecutor;
pub use team::TeamExecutor;
pub use trigger::TriggerExecutor;

use hubcore::{AgentRunner, Context, Evaluator, IntegrationRunner, NodeContext, NodeSpec, PassThrough};
use hubruntime::{NodeExecutorRegistry, NodeHandlers};
use hubteams::TeamOrchestrator;
use std::sync::Arc;

/// External systems the standard executors call into
#[derive(Clone)]
pub struct Collaborators {
    pub agents: Arc<dyn AgentRunner>,
    pub teams: Arc<TeamOrchestrator>,
    pub integrations: Arc<dyn IntegrationRunner>,
    pub evaluator: Arc<dyn Evaluator>,
}

impl Collaborators {
    /// Collaborators with the pass-through evaluator for condition and
    /// transform nodes
    pub fn new(
        agents: Arc<dyn AgentRunner>,
        teams: Arc<TeamOrchestrator>,
        integrations: Arc<dyn IntegrationRunner>,
    ) -> Self {
        Self {
            agents,
            teams,
            integrations,
            evaluator: Arc::new(PassThrough),
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }
}

/// Registry with every standard executor
pub fn standard_registry(collaborators: Collaborators) -> NodeExecutorRegistry {
    NodeExecutorRegistry::new(NodeHandlers {
        trigger: Arc::new(TriggerExecutor),
        ai_agent: Arc::new(AgentExecutor::new(collaborators.agents)),
        agent_team: Arc::new(TeamExecutor::new(collaborators.teams)),
        integration: Arc::new(IntegrationExecutor::new(collaborators.integrations)),
        condition: Arc::new(EvaluatorExecutor::condition(collaborators.evaluator.clone())),
        transform: Arc::new(EvaluatorExecutor::transform(collaborators.evaluator)),
    })
}

/// `data.task`, else the whole context as JSON
pub(crate) fn task_for(node: &NodeSpec, ctx: &NodeContext) -> String {
    node.data_str("task")
        .map(str::to_string)
        .unwrap_or_else(|| ctx.serialized())
}

/// `data.context` when it is an object, else the accumulated context
pub(crate) fn context_for(node: &NodeSpec, ctx: &NodeContext) -> Context {
    match node.data.get("context") {
        Some(serde_json::Value::Object(map)) => map.clone(),
        _ => ctx.data.clone(),
    }
}
