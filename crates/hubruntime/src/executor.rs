use crate::graph;
use crate::registry::NodeExecutorRegistry;
use chrono::Utc;
use futures::FutureExt;
use hubcore::{
    Context, EventBus, Execution, ExecutionEvent, ExecutionId, ExecutionLogEntry, ExecutionPatch,
    ExecutionStatus, NodeContext, NodeError, NodeOutput, NodeSpec, TenantId, WorkflowDefinition,
    WorkflowStore,
};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Drives one execution from PENDING to a terminal state
pub struct ExecutionRunner {
    registry: Arc<NodeExecutorRegistry>,
    store: Arc<dyn WorkflowStore>,
    event_bus: Arc<EventBus>,
    node_timeout: Option<Duration>,
}

/// Everything accumulated while walking the node order
#[derive(Default)]
struct WalkState {
    context: Context,
    logs: Vec<ExecutionLogEntry>,
    nodes_executed: u32,
    tokens_used: u64,
    cost: f64,
}

impl ExecutionRunner {
    pub fn new(
        registry: Arc<NodeExecutorRegistry>,
        store: Arc<dyn WorkflowStore>,
        event_bus: Arc<EventBus>,
        node_timeout: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            store,
            event_bus,
            node_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<NodeExecutorRegistry> {
        &self.registry
    }

    /// Run a freshly created execution against its definition snapshot and
    /// return the execution as it was last written.
    pub async fn run(
        &self,
        mut execution: Execution,
        definition: WorkflowDefinition,
        cancellation: CancellationToken,
    ) -> Execution {
        let start_time = Instant::now();
        let execution_id = execution.id;

        self.transition(&mut execution, ExecutionPatch::status(ExecutionStatus::Running))
            .await;

        self.event_bus.emit(ExecutionEvent::WorkflowStarted {
            execution_id,
            workflow_id: definition.id,
            timestamp: Utc::now(),
        });
        tracing::info!("Starting workflow execution: {} ({})", definition.name, execution_id);

        let mut state = WalkState {
            context: execution.input.clone(),
            ..Default::default()
        };
        let result = self
            .walk(&definition, execution_id, &execution.tenant, &mut state, &cancellation)
            .await;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let status = match result {
            Ok(()) => ExecutionStatus::Completed,
            Err(_) => ExecutionStatus::Failed,
        };

        let patch = ExecutionPatch {
            status: Some(status),
            output: Some(state.context),
            logs: Some(state.logs),
            nodes_executed: Some(state.nodes_executed),
            tokens_used: Some(state.tokens_used),
            cost: Some(state.cost),
            error: result.as_ref().err().map(ToString::to_string),
            completed_at: Some(Utc::now()),
            duration_ms: Some(duration_ms),
        };
        self.transition(&mut execution, patch).await;

        match &result {
            Ok(()) => {
                tracing::info!(
                    "Workflow execution {} completed in {}ms ({} nodes, {} tokens)",
                    execution_id,
                    duration_ms,
                    execution.nodes_executed,
                    execution.tokens_used
                );
                if let Err(e) = self.store.increment_definition_stats(definition.id).await {
                    tracing::error!("Failed to update stats for workflow {}: {}", definition.id, e);
                }
            }
            Err(e) => {
                tracing::warn!("Workflow execution {} failed after {}ms: {}", execution_id, duration_ms, e);
            }
        }

        self.event_bus.emit(ExecutionEvent::WorkflowCompleted {
            execution_id,
            status,
            duration_ms,
            timestamp: Utc::now(),
        });

        execution
    }

    /// Persist a state transition and mirror it on the local copy
    async fn transition(&self, execution: &mut Execution, patch: ExecutionPatch) {
        if let Err(e) = self.store.update_execution(execution.id, patch.clone()).await {
            tracing::error!("Failed to persist execution {}: {}", execution.id, e);
        }
        execution.apply(patch);
    }

    /// Execute nodes in topological order, stopping at the first failure
    async fn walk(
        &self,
        definition: &WorkflowDefinition,
        execution_id: ExecutionId,
        tenant: &TenantId,
        state: &mut WalkState,
        cancellation: &CancellationToken,
    ) -> Result<(), NodeError> {
        let order = graph::order(&definition.nodes, &definition.edges);
        tracing::debug!(
            "Execution {} order: {:?}",
            execution_id,
            order.iter().map(|n| n.id.as_str()).collect::<Vec<_>>()
        );

        for node in order {
            if cancellation.is_cancelled() {
                return Err(NodeError::Cancelled);
            }

            let node_start = Instant::now();
            let label = node
                .label()
                .map(str::to_string)
                .unwrap_or_else(|| node.node_type.to_string());

            state.logs.push(ExecutionLogEntry::new(
                &node.id,
                node.display_name(),
                ExecutionStatus::Running,
                format!("Executing node: {}", label),
            ));
            self.event_bus.emit(ExecutionEvent::NodeStarted {
                execution_id,
                node_id: node.id.clone(),
                node_type: node.node_type,
                timestamp: Utc::now(),
            });

            let ctx = NodeContext::new(
                execution_id,
                Some(tenant.clone()),
                state.context.clone(),
                self.event_bus.create_emitter(execution_id, node.id.clone()),
            );

            match self.execute_node(node, &ctx, cancellation).await {
                Ok(output) => {
                    let duration_ms = node_start.elapsed().as_millis() as u64;
                    tracing::debug!("Node {} completed in {}ms", node.id, duration_ms);

                    for (key, value) in &output.output {
                        state.context.insert(key.clone(), value.clone());
                    }
                    state.tokens_used += output.tokens_used;
                    state.cost += output.cost;
                    state.nodes_executed += 1;

                    self.event_bus.emit(ExecutionEvent::NodeCompleted {
                        execution_id,
                        node_id: node.id.clone(),
                        tokens_used: output.tokens_used,
                        duration_ms,
                        timestamp: Utc::now(),
                    });
                    state.logs.push(
                        ExecutionLogEntry::new(
                            &node.id,
                            node.display_name(),
                            ExecutionStatus::Completed,
                            format!("Node completed in {}ms", duration_ms),
                        )
                        .with_data(output.output),
                    );
                }
                Err(e) => {
                    tracing::error!("Node {} failed: {}", node.id, e);

                    self.event_bus.emit(ExecutionEvent::NodeFailed {
                        execution_id,
                        node_id: node.id.clone(),
                        error: e.to_string(),
                        timestamp: Utc::now(),
                    });
                    state.logs.push(
                        ExecutionLogEntry::new(
                            &node.id,
                            node.display_name(),
                            ExecutionStatus::Failed,
                            format!("Node failed: {}", e),
                        )
                        .with_error(e.to_string()),
                    );
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Run one node under the optional timeout, racing cancellation.
    /// A panicking executor counts as a node failure.
    async fn execute_node(
        &self,
        node: &NodeSpec,
        ctx: &NodeContext,
        cancellation: &CancellationToken,
    ) -> Result<NodeOutput, NodeError> {
        let run = AssertUnwindSafe(self.registry.execute(node, ctx))
            .catch_unwind()
            .map(|result| result.unwrap_or_else(|panic| Err(NodeError::Panicked(panic_message(panic)))));

        let limited = async {
            match self.node_timeout {
                Some(limit) => tokio::time::timeout(limit, run).await.unwrap_or(Err(
                    NodeError::Timeout {
                        millis: limit.as_millis() as u64,
                    },
                )),
                None => run.await,
            }
        };

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(NodeError::Cancelled),
            result = limited => result,
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
