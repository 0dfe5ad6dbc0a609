//! Workflow execution runtime
//!
//! Graph validation and scheduling, the node executor registry, and the
//! runner that walks a workflow to completion on a background task.

mod config;
mod executor;
pub mod graph;
mod registry;
mod runtime;
mod store;

pub use config::EngineConfig;
pub use executor::ExecutionRunner;
pub use graph::{order, validate};
pub use registry::{NodeExecutorRegistry, NodeHandlers};
pub use runtime::{ExecutionHandle, WorkflowEngine};
pub use store::InMemoryStore;
