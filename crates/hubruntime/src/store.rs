use crate::graph;
use async_trait::async_trait;
use chrono::Utc;
use hubcore::{
    Context, Edge, Execution, ExecutionId, ExecutionPatch, ExecutionStatus, NodeSpec,
    WorkflowDefinition, WorkflowError, WorkflowId, WorkflowStore,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local [`WorkflowStore`]; also records every status write so the
/// transition history of an execution can be inspected.
#[derive(Default)]
pub struct InMemoryStore {
    workflows: RwLock<HashMap<WorkflowId, WorkflowDefinition>>,
    executions: RwLock<HashMap<ExecutionId, Execution>>,
    status_history: RwLock<HashMap<ExecutionId, Vec<ExecutionStatus>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a definition
    pub async fn register_workflow(
        &self,
        definition: WorkflowDefinition,
    ) -> Result<WorkflowId, WorkflowError> {
        graph::validate_definition(&definition)?;
        Ok(self.insert_workflow(definition).await)
    }

    /// Store a definition as-is, e.g. one loaded from another system
    pub async fn insert_workflow(&self, definition: WorkflowDefinition) -> WorkflowId {
        let id = definition.id;
        tracing::info!("Storing workflow: {} ({})", definition.name, id);
        self.workflows.write().await.insert(id, definition);
        id
    }

    /// Replace a definition's graph. The new graph must validate.
    pub async fn update_graph(
        &self,
        id: WorkflowId,
        tenant: &str,
        nodes: Vec<NodeSpec>,
        edges: Vec<Edge>,
    ) -> Result<(), WorkflowError> {
        graph::validate(&nodes, &edges)?;

        let mut workflows = self.workflows.write().await;
        let definition = workflows
            .get_mut(&id)
            .filter(|d| d.tenant == tenant)
            .ok_or_else(|| WorkflowError::WorkflowNotFound(id.to_string()))?;
        definition.nodes = nodes;
        definition.edges = edges;
        Ok(())
    }

    pub async fn set_active(&self, id: WorkflowId, active: bool) -> Result<(), WorkflowError> {
        let mut workflows = self.workflows.write().await;
        let definition = workflows
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::WorkflowNotFound(id.to_string()))?;
        definition.is_active = active;
        Ok(())
    }

    pub async fn get_workflow(&self, id: WorkflowId) -> Option<WorkflowDefinition> {
        self.workflows.read().await.get(&id).cloned()
    }

    pub async fn list_executions(&self, workflow_id: WorkflowId) -> Vec<Execution> {
        let executions = self.executions.read().await;
        let mut list: Vec<Execution> = executions
            .values()
            .filter(|e| e.workflow_id == workflow_id)
            .cloned()
            .collect();
        list.sort_by_key(|e| e.started_at);
        list
    }

    /// Status written by each create/update, oldest first
    pub async fn status_history(&self, id: ExecutionId) -> Vec<ExecutionStatus> {
        self.status_history
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryStore {
    async fn find_active_definition(
        &self,
        id: WorkflowId,
        tenant: &str,
    ) -> Result<Option<WorkflowDefinition>, WorkflowError> {
        let workflows = self.workflows.read().await;
        Ok(workflows.get(&id).filter(|d| d.tenant == tenant).cloned())
    }

    async fn create_execution(
        &self,
        definition: &WorkflowDefinition,
        input: Context,
    ) -> Result<Execution, WorkflowError> {
        let execution = Execution::pending(definition.id, definition.tenant.clone(), input);
        self.status_history
            .write()
            .await
            .insert(execution.id, vec![execution.status]);
        self.executions
            .write()
            .await
            .insert(execution.id, execution.clone());
        Ok(execution)
    }

    async fn update_execution(
        &self,
        id: ExecutionId,
        patch: ExecutionPatch,
    ) -> Result<(), WorkflowError> {
        let mut executions = self.executions.write().await;
        let execution = executions
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::ExecutionNotFound(id.to_string()))?;

        if execution.status.is_terminal() {
            return Err(WorkflowError::Store(format!(
                "Execution {} is already {:?}",
                id, execution.status
            )));
        }

        execution.apply(patch);
        self.status_history
            .write()
            .await
            .entry(id)
            .or_default()
            .push(execution.status);
        Ok(())
    }

    async fn increment_definition_stats(&self, id: WorkflowId) -> Result<(), WorkflowError> {
        let mut workflows = self.workflows.write().await;
        let definition = workflows
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::WorkflowNotFound(id.to_string()))?;
        definition.execution_count += 1;
        definition.last_executed = Some(Utc::now());
        Ok(())
    }

    async fn get_execution(&self, id: ExecutionId) -> Result<Option<Execution>, WorkflowError> {
        Ok(self.executions.read().await.get(&id).cloned())
    }
}
