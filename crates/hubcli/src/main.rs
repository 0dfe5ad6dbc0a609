// crates/hubcli/src/main.rs

mod scripted;

use anyhow::{anyhow, bail, Context as _, Result};
use clap::{Parser, Subcommand};
use hubcore::{Context, ExecutionEvent, ExecutionStatus, NodeEvent, WorkflowDefinition};
use hubnodes::{standard_registry, Collaborators};
use hubruntime::{EngineConfig, InMemoryStore, NodeExecutorRegistry, WorkflowEngine};
use hubteams::{InMemoryTeamStore, TeamOrchestrator};
use scripted::{AgentScript, ScriptedAgents, ScriptedIntegrations};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hub")]
#[command(about = "Agent automation hub CLI", long_about = None)]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow file against scripted collaborators
    Run {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Input data as a JSON object
        #[arg(short, long)]
        input: Option<String>,

        /// JSON file with canned agent, team and integration replies
        #[arg(short, long)]
        agent_script: Option<PathBuf>,

        /// Tenant the workflow runs under
        #[arg(short, long, default_value = "local")]
        tenant: String,

        /// Fail any node running longer than this
        #[arg(long)]
        node_timeout_ms: Option<u64>,
    },

    /// Validate a workflow file
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// Print the order nodes would run in
    Order {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// List available node types
    Nodes,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Run {
            file,
            input,
            agent_script,
            tenant,
            node_timeout_ms,
        } => {
            let script = match agent_script {
                Some(path) => AgentScript::load(&path)?,
                None => AgentScript::default(),
            };
            run_workflow(&file, input, script, tenant, node_timeout_ms).await?;
        }

        Commands::Validate { file } => {
            validate_workflow(&file)?;
        }

        Commands::Order { file } => {
            print_order(&file)?;
        }

        Commands::Nodes => {
            list_nodes();
        }
    }

    Ok(())
}

fn load_workflow(file: &Path) -> Result<WorkflowDefinition> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading workflow {}", file.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing workflow {}", file.display()))
}

fn parse_input(input: Option<String>) -> Result<Context> {
    let Some(raw) = input else {
        return Ok(Context::new());
    };
    match serde_json::from_str::<serde_json::Value>(&raw)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(anyhow!("Input must be a JSON object")),
    }
}

fn build_registry(
    script: &AgentScript,
    teams: Arc<InMemoryTeamStore>,
) -> NodeExecutorRegistry {
    let agents = Arc::new(ScriptedAgents::new(script.agents.clone()));
    let collaborators = Collaborators::new(
        agents.clone(),
        Arc::new(TeamOrchestrator::new(teams, agents)),
        Arc::new(ScriptedIntegrations::new(script.integrations.clone())),
    );
    standard_registry(collaborators)
}

async fn run_workflow(
    file: &Path,
    input: Option<String>,
    script: AgentScript,
    tenant: String,
    node_timeout_ms: Option<u64>,
) -> Result<()> {
    println!("🚀 Loading workflow from: {}", file.display());

    let mut definition = load_workflow(file)?;
    definition.tenant = tenant.clone();
    let input = parse_input(input)?;

    println!("📋 Workflow: {}", definition.name);
    println!("   Nodes: {}", definition.nodes.len());
    println!("   Edges: {}", definition.edges.len());
    println!();

    let teams = Arc::new(InMemoryTeamStore::new());
    for mut team in script.teams.clone() {
        team.tenant = tenant.clone();
        teams.insert_team(team).await;
    }

    let mut config = EngineConfig::from_env();
    if let Some(ms) = node_timeout_ms {
        config = config.with_node_timeout(Duration::from_millis(ms));
    }

    let store = Arc::new(InMemoryStore::new());
    let engine = WorkflowEngine::new(store.clone(), build_registry(&script, teams), config);
    let workflow_id = store.register_workflow(definition).await?;

    let mut events = engine.subscribe_events();
    let handle = engine.execute_workflow(workflow_id, &tenant, input).await?;
    let execution_id = handle.execution_id();

    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if event.execution_id() != execution_id {
                continue;
            }
            match event {
                ExecutionEvent::WorkflowStarted { .. } => {
                    println!("▶️  Workflow started");
                }
                ExecutionEvent::NodeStarted { node_id, node_type, .. } => {
                    println!("  ⚡ Starting node: {} ({})", node_id, node_type);
                }
                ExecutionEvent::NodeCompleted {
                    node_id,
                    tokens_used,
                    duration_ms,
                    ..
                } => {
                    println!(
                        "  ✅ Node {} completed in {}ms ({} tokens)",
                        node_id, duration_ms, tokens_used
                    );
                }
                ExecutionEvent::NodeFailed { node_id, error, .. } => {
                    println!("  ❌ Node {} failed: {}", node_id, error);
                }
                ExecutionEvent::NodeEvent { node_id, event, .. } => match event {
                    NodeEvent::Info { message } => println!("     ℹ️  [{}] {}", node_id, message),
                    NodeEvent::Warning { message } => println!("     ⚠️  [{}] {}", node_id, message),
                },
                ExecutionEvent::WorkflowCompleted {
                    status, duration_ms, ..
                } => {
                    if status == ExecutionStatus::Completed {
                        println!("✨ Workflow completed successfully in {}ms", duration_ms);
                    } else {
                        println!("💥 Workflow failed after {}ms", duration_ms);
                    }
                    break;
                }
            }
        }
    });

    let execution = handle.wait().await?;
    let _ = printer.await;

    println!();
    println!("📊 Execution Summary:");
    println!("   Execution ID: {}", execution.id);
    println!("   Status: {:?}", execution.status);
    println!("   Nodes executed: {}", execution.nodes_executed);
    println!("   Tokens: {} (cost {:.4})", execution.tokens_used, execution.cost);

    if let Some(output) = &execution.output {
        println!();
        println!("📤 Output:");
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::Value::Object(output.clone()))?
        );
    }

    if execution.status == ExecutionStatus::Failed {
        bail!(
            "Execution failed: {}",
            execution.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}

fn validate_workflow(file: &Path) -> Result<()> {
    println!("🔍 Validating workflow: {}", file.display());

    let workflow = load_workflow(file)?;
    hubruntime::validate(&workflow.nodes, &workflow.edges)
        .with_context(|| format!("workflow '{}' is invalid", workflow.name))?;

    println!("✅ Workflow is valid:");
    println!("   Name: {}", workflow.name);
    println!("   Nodes: {}", workflow.nodes.len());
    println!("   Edges: {}", workflow.edges.len());

    Ok(())
}

fn print_order(file: &Path) -> Result<()> {
    let workflow = load_workflow(file)?;
    hubruntime::validate(&workflow.nodes, &workflow.edges)
        .with_context(|| format!("workflow '{}' is invalid", workflow.name))?;

    for (i, node) in hubruntime::order(&workflow.nodes, &workflow.edges)
        .into_iter()
        .enumerate()
    {
        println!("{:>3}. {} ({}) {}", i + 1, node.id, node.node_type, node.display_name());
    }

    Ok(())
}

fn list_nodes() {
    println!("📦 Available Node Types:");
    println!();

    let registry = build_registry(&AgentScript::default(), Arc::new(InMemoryTeamStore::new()));
    for node_type in registry.list_node_types() {
        let metadata = registry.get_metadata(node_type);
        println!("  • {} ({})", node_type, metadata.category);
        println!("    {}", metadata.description);
    }
}
