use crate::{graph, EngineConfig, ExecutionRunner, NodeExecutorRegistry};
use hubcore::{
    Context, EventBus, Execution, ExecutionEvent, ExecutionId, WorkflowError, WorkflowId,
    WorkflowStore,
};
use std::sync::Arc;
use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Entry point for running stored workflows
pub struct WorkflowEngine {
    store: Arc<dyn WorkflowStore>,
    runner: Arc<ExecutionRunner>,
    event_bus: Arc<EventBus>,
    permits: Arc<Semaphore>,
}

impl WorkflowEngine {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        registry: NodeExecutorRegistry,
        config: EngineConfig,
    ) -> Self {
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));
        let runner = Arc::new(ExecutionRunner::new(
            Arc::new(registry),
            store.clone(),
            event_bus.clone(),
            config.node_timeout,
        ));

        Self {
            store,
            runner,
            event_bus,
            permits: Arc::new(Semaphore::new(config.max_concurrent_executions.max(1))),
        }
    }

    pub fn registry(&self) -> &Arc<NodeExecutorRegistry> {
        self.runner.registry()
    }

    /// Start a workflow for `tenant`.
    ///
    /// Lookup and validation failures are returned here and no execution is
    /// created. Otherwise the execution exists in PENDING when this returns
    /// and its nodes run on a background task; the handle can be awaited,
    /// cancelled, or simply dropped.
    pub async fn execute_workflow(
        &self,
        workflow_id: WorkflowId,
        tenant: &str,
        input: Context,
    ) -> Result<ExecutionHandle, WorkflowError> {
        let definition = self
            .store
            .find_active_definition(workflow_id, tenant)
            .await?
            .ok_or_else(|| WorkflowError::WorkflowNotFound(workflow_id.to_string()))?;

        if !definition.is_active {
            return Err(WorkflowError::WorkflowInactive(workflow_id.to_string()));
        }

        graph::validate_definition(&definition)?;

        let execution = self.store.create_execution(&definition, input).await?;
        let execution_id = execution.id;
        tracing::info!("Queued execution {} for workflow {}", execution_id, workflow_id);

        let cancellation = CancellationToken::new();
        let runner = self.runner.clone();
        let permits = self.permits.clone();
        let token = cancellation.clone();

        let join = tokio::spawn(async move {
            // The semaphore is never closed
            let _permit = permits.acquire_owned().await.ok();
            runner.run(execution, definition, token).await
        });

        Ok(ExecutionHandle {
            execution_id,
            cancellation,
            join,
        })
    }

    /// Current state of an execution, for callers that poll
    pub async fn get_execution(&self, id: ExecutionId) -> Result<Execution, WorkflowError> {
        self.store
            .get_execution(id)
            .await?
            .ok_or_else(|| WorkflowError::ExecutionNotFound(id.to_string()))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }
}

/// Handle to a background execution
pub struct ExecutionHandle {
    execution_id: ExecutionId,
    cancellation: CancellationToken,
    join: JoinHandle<Execution>,
}

impl ExecutionHandle {
    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    /// Ask the execution to stop. It ends FAILED with a `Cancelled` error;
    /// an execution that already finished is unaffected.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Wait for the terminal state
    pub async fn wait(self) -> Result<Execution, WorkflowError> {
        self.join
            .await
            .map_err(|e| WorkflowError::Execution(format!("Task join error: {}", e)))
    }
}
