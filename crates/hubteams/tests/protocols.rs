// crates/hubteams/tests/protocols.rs

use async_trait::async_trait;
use hubcore::{
    AgentRun, AgentRunner, CollaboratorError, Context, Team, TeamError, TeamMember,
    TeamStructure,
};
use hubteams::{InMemoryTeamStore, TeamOrchestrator};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

type Script = Box<dyn Fn(&str, &str) -> Result<AgentRun, CollaboratorError> + Send + Sync>;

/// Agent collaborator that answers from a script and records every prompt
struct ScriptedAgents {
    calls: Mutex<Vec<(String, String)>>,
    script: Script,
}

impl ScriptedAgents {
    fn new(
        script: impl Fn(&str, &str) -> Result<AgentRun, CollaboratorError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            script: Box::new(script),
        })
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn prompts_for(&self, agent_id: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(agent, _)| agent == agent_id)
            .map(|(_, prompt)| prompt)
            .collect()
    }
}

#[async_trait]
impl AgentRunner for ScriptedAgents {
    async fn run_agent(
        &self,
        agent_id: &str,
        _tenant: &str,
        task: &str,
        _context: &Context,
    ) -> Result<AgentRun, CollaboratorError> {
        self.calls
            .lock()
            .unwrap()
            .push((agent_id.to_string(), task.to_string()));
        (self.script)(agent_id, task)
    }
}

async fn orchestrator(team: Team, agents: Arc<ScriptedAgents>) -> TeamOrchestrator {
    let store = Arc::new(InMemoryTeamStore::new());
    store.insert_team(team).await;
    TeamOrchestrator::new(store, agents)
}

fn three_member_team(structure: TeamStructure) -> Team {
    Team::new("team_1", "org_1", structure)
        .with_member(TeamMember::new("a", "researcher").named("Ada"))
        .with_member(TeamMember::new("b", "writer").named("Bo"))
        .with_member(TeamMember::new("c", "editor").named("Cy"))
}

#[tokio::test]
async fn hierarchical_workers_receive_their_own_subtask() {
    let team = Team::new("team_1", "org_1", TeamStructure::Hierarchical)
        .with_member(TeamMember::new("w1", "analyst").named("Wen"))
        .with_member(TeamMember::new("boss", "leader").named("Lee"))
        .with_member(TeamMember::new("w2", "analyst").named("Wil"))
        .with_member(TeamMember::new("w3", "analyst").named("Wu"));

    let agents = ScriptedAgents::new(|agent, prompt| {
        let reply = if prompt.starts_with("You are the team leader") {
            "Plan:\n1. Collect sources\n2. Draft outline\n3. Check facts".to_string()
        } else if prompt.starts_with("As the team leader") {
            "final report".to_string()
        } else {
            format!("{} done", agent)
        };
        Ok(AgentRun::content(reply, 10, 0.01))
    });
    let result = orchestrator(team, agents.clone())
        .await
        .execute_team_task("team_1", "org_1", "Write the launch brief", None)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.pattern, TeamStructure::Hierarchical);
    assert_eq!(result.output, json!({"content": "final report"}));

    let leader_prompts = agents.prompts_for("boss");
    assert_eq!(leader_prompts.len(), 2);
    assert!(leader_prompts[0].contains("break it down into 3 specific subtasks"));
    assert!(leader_prompts[1].contains("w2 done"));

    for (worker, subtask) in [("w1", "Collect sources"), ("w2", "Draft outline"), ("w3", "Check facts")] {
        let prompts = agents.prompts_for(worker);
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(&format!("specific subtask:\n\n{}\n\n", subtask)), "{}", prompts[0]);
        assert!(prompts[0].ends_with("Context: Write the launch brief"));
    }

    assert_eq!(result.agent_outputs["workers"].as_array().unwrap().len(), 3);
    assert_eq!(result.agent_outputs["workers"][0], json!({"content": "w1 done"}));
    assert_eq!(result.total_tokens, 50);
    assert!((result.total_cost - 0.05).abs() < 1e-9);

    let contents: Vec<&str> = result.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents.len(), 5);
    assert!(contents[0].starts_with("Leader Analysis: "));
    assert!(contents[1].starts_with("Wen Result: "));
    assert!(contents[3].starts_with("Wu Result: "));
    assert_eq!(result.messages[1].to.as_deref(), Some("boss"));
    assert!(contents[4].starts_with("Final Synthesis: "));
}

/// Leader answers at once; every worker call takes `WORKER_DELAY`
struct SlowWorkers;

const WORKER_DELAY: Duration = Duration::from_millis(300);

#[async_trait]
impl AgentRunner for SlowWorkers {
    async fn run_agent(
        &self,
        agent_id: &str,
        _tenant: &str,
        task: &str,
        _context: &Context,
    ) -> Result<AgentRun, CollaboratorError> {
        if task.contains("a team member. Execute this specific subtask") {
            tokio::time::sleep(WORKER_DELAY).await;
            return Ok(AgentRun::content(format!("{} done", agent_id), 1, 0.0));
        }
        Ok(AgentRun::content("1. one\n2. two\n3. three", 1, 0.0))
    }
}

#[tokio::test]
async fn hierarchical_workers_run_concurrently() {
    let team = Team::new("team_1", "org_1", TeamStructure::Hierarchical)
        .with_member(TeamMember::new("boss", "leader"))
        .with_member(TeamMember::new("w1", "analyst"))
        .with_member(TeamMember::new("w2", "analyst"))
        .with_member(TeamMember::new("w3", "analyst"));
    let store = Arc::new(InMemoryTeamStore::new());
    store.insert_team(team).await;
    let orchestrator = TeamOrchestrator::new(store, Arc::new(SlowWorkers));

    let started = Instant::now();
    let result = orchestrator
        .execute_team_task("team_1", "org_1", "Audit the accounts", None)
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(result.agent_outputs["workers"].as_array().unwrap().len(), 3);
    assert!(elapsed >= WORKER_DELAY, "{:?}", elapsed);
    // Sequential workers would need three delays
    assert!(elapsed < WORKER_DELAY * 2, "workers ran one after another: {:?}", elapsed);
}

#[tokio::test]
async fn democratic_majority_wins() {
    let agents = ScriptedAgents::new(|agent, prompt| {
        if prompt.starts_with("Propose") {
            return Ok(AgentRun::content(format!("plan from {}", agent), 1, 0.0));
        }
        let ballot = match agent {
            "a" => "0",
            "b" => "I prefer 1",
            _ => "Proposal 0 is strongest",
        };
        Ok(AgentRun::content(ballot, 1, 0.0))
    });
    let result = orchestrator(three_member_team(TeamStructure::Democratic), agents.clone())
        .await
        .execute_team_task("team_1", "org_1", "Pick a name", None)
        .await
        .unwrap();

    let voting = result.voting_results.expect("voting results");
    assert_eq!(voting.votes, vec![0, 1, 0]);
    assert_eq!(voting.winner_index, 0);
    assert_eq!(voting.winner.agent_id, "a");
    assert_eq!(voting.proposals.len(), 3);
    assert_eq!(result.output, json!({"content": "plan from a"}));

    let ballot = &agents.prompts_for("c")[1];
    assert!(ballot.contains("Proposal 1 (Bo):\nplan from b"));

    let contents: Vec<&str> = result.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents.len(), 6);
    assert!(contents[0].starts_with("Proposal from Ada: "));
    assert_eq!(&contents[3..], &["Vote: 0", "Vote: 1", "Vote: 0"]);
}

#[tokio::test]
async fn democratic_tie_goes_to_the_first_vote_cast() {
    let team = Team::new("team_1", "org_1", TeamStructure::Democratic)
        .with_member(TeamMember::new("a", "member"))
        .with_member(TeamMember::new("b", "member"));
    let agents = ScriptedAgents::new(|agent, prompt| {
        let reply = match (prompt.starts_with("Propose"), agent) {
            (true, _) => format!("idea {}", agent),
            (false, "a") => "1".to_string(),
            (false, _) => "0".to_string(),
        };
        Ok(AgentRun::content(reply, 0, 0.0))
    });
    let result = orchestrator(team, agents)
        .await
        .execute_team_task("team_1", "org_1", "Decide", None)
        .await
        .unwrap();

    let voting = result.voting_results.unwrap();
    assert_eq!(voting.votes, vec![1, 0]);
    assert_eq!(voting.winner_index, 1);
    assert_eq!(result.output, json!({"content": "idea b"}));
}

#[tokio::test]
async fn pipeline_feeds_each_stage_the_previous_output() {
    let agents = ScriptedAgents::new(|agent, _| {
        Ok(AgentRun::content(format!("stage-{}-output", agent), 2, 0.0))
    });
    let result = orchestrator(three_member_team(TeamStructure::Pipeline), agents.clone())
        .await
        .execute_team_task("team_1", "org_1", "Translate the memo", None)
        .await
        .unwrap();

    let a = &agents.prompts_for("a")[0];
    let b = &agents.prompts_for("b")[0];
    let c = &agents.prompts_for("c")[0];
    assert!(a.starts_with("You are the first agent in the pipeline."));
    assert!(a.ends_with("Translate the memo"));
    assert!(b.starts_with("You are agent 2 in the pipeline."));
    assert!(b.contains("stage-a-output"));
    assert!(c.starts_with("You are the final agent in the pipeline."));
    assert!(c.contains("stage-b-output"));

    assert_eq!(result.output, json!("stage-c-output"));
    assert_eq!(result.total_tokens, 6);
    assert_eq!(result.messages[0].content, r#"Pipeline Stage 1: {"content":"stage-a-output"}"#);
    assert_eq!(result.messages[0].to.as_deref(), Some("b"));
    assert_eq!(result.messages[2].to, None);
}

#[tokio::test]
async fn pipeline_order_configuration_is_honoured() {
    let team = three_member_team(TeamStructure::Pipeline).with_pipeline_order(["c", "a"]);
    let agents = ScriptedAgents::new(|agent, _| Ok(AgentRun::content(agent, 0, 0.0)));
    orchestrator(team, agents.clone())
        .await
        .execute_team_task("team_1", "org_1", "Go", None)
        .await
        .unwrap();

    let order: Vec<String> = agents.calls().into_iter().map(|(agent, _)| agent).collect();
    assert_eq!(order, vec!["c", "a", "b"]);
}

#[tokio::test]
async fn single_member_pipeline_uses_the_first_prompt() {
    let team = Team::new("solo", "org_1", TeamStructure::Pipeline)
        .with_member(TeamMember::new("only", "member"));
    let agents = ScriptedAgents::new(|_, _| Ok(AgentRun::content("done", 0, 0.0)));
    let result = orchestrator(team, agents.clone())
        .await
        .execute_team_task("solo", "org_1", "Summarise", None)
        .await
        .unwrap();

    assert!(agents.prompts_for("only")[0].starts_with("You are the first agent"));
    assert_eq!(result.output, json!("done"));
}

#[tokio::test]
async fn failing_member_leaves_an_error_record() {
    let agents = ScriptedAgents::new(|agent, _| {
        if agent == "b" {
            Err(anyhow::anyhow!("rate limited"))
        } else {
            Ok(AgentRun::content(format!("{} thoughts", agent), 5, 0.1))
        }
    });
    let result = orchestrator(three_member_team(TeamStructure::Collaborative), agents.clone())
        .await
        .execute_team_task("team_1", "org_1", "Review the draft", None)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(
        result.agent_outputs["b"],
        json!({
            "type": "error",
            "message": "rate limited",
            "content": "Failed to execute agent Bo",
        })
    );
    assert_eq!(result.agent_outputs["a"], json!({"content": "a thoughts"}));

    // Coordinator synthesizes, error record included
    let synthesis = &agents.prompts_for("a")[1];
    assert!(synthesis.starts_with("Synthesize all team contributions"));
    assert!(synthesis.contains("Failed to execute agent Bo"));
    assert_eq!(result.output, json!({"content": "a thoughts"}));

    // Three contributions plus the synthesis, failed call adds nothing
    assert_eq!(result.total_tokens, 15);
    assert_eq!(result.messages.len(), 4);
    assert!(result.messages[1].content.starts_with("Bo: "));
}

#[tokio::test]
async fn pattern_override_replaces_the_team_structure() {
    let agents = ScriptedAgents::new(|agent, _| Ok(AgentRun::content(agent, 0, 0.0)));
    let result = orchestrator(three_member_team(TeamStructure::Democratic), agents)
        .await
        .execute_team_task("team_1", "org_1", "Go", Some(TeamStructure::Pipeline))
        .await
        .unwrap();

    assert_eq!(result.pattern, TeamStructure::Pipeline);
    assert!(result.voting_results.is_none());
    assert_eq!(result.output, json!("c"));
}

#[tokio::test]
async fn unknown_or_empty_teams_are_rejected() {
    let store = Arc::new(InMemoryTeamStore::new());
    store
        .insert_team(Team::new("empty", "org_1", TeamStructure::Collaborative))
        .await;
    store
        .insert_team(three_member_team(TeamStructure::Collaborative))
        .await;
    let agents = ScriptedAgents::new(|_, _| Ok(AgentRun::content("x", 0, 0.0)));
    let orchestrator = TeamOrchestrator::new(store, agents.clone());

    let err = orchestrator
        .execute_team_task("missing", "org_1", "task", None)
        .await
        .unwrap_err();
    assert!(matches!(err, TeamError::TeamNotFound(_)));

    let err = orchestrator
        .execute_team_task("team_1", "org_2", "task", None)
        .await
        .unwrap_err();
    assert!(matches!(err, TeamError::TeamNotFound(_)));

    let err = orchestrator
        .execute_team_task("empty", "org_1", "task", None)
        .await
        .unwrap_err();
    assert!(matches!(err, TeamError::NoValidAgents(_)));
    assert!(agents.calls().is_empty());
}
