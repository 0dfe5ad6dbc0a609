use crate::parsing::{content_of, extract_subtasks, extract_vote_index, most_voted};
use crate::Transcript;
use futures::future::join_all;
use hubcore::{
    AgentMessage, AgentRunner, Context, Proposal, Team, TeamError, TeamExecutionResult,
    TeamMember, TeamStore, TeamStructure, VotingResults,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// Runs tasks across the members of a team
pub struct TeamOrchestrator {
    teams: Arc<dyn TeamStore>,
    agents: Arc<dyn AgentRunner>,
}

impl TeamOrchestrator {
    pub fn new(teams: Arc<dyn TeamStore>, agents: Arc<dyn AgentRunner>) -> Self {
        Self { teams, agents }
    }

    /// Run `task` across the team's members.
    ///
    /// `pattern_override` replaces the team's own structure for this call.
    /// A failing member never fails the team: its output becomes an error
    /// record and the protocol carries on.
    pub async fn execute_team_task(
        &self,
        team_id: &str,
        tenant: &str,
        task: &str,
        pattern_override: Option<TeamStructure>,
    ) -> Result<TeamExecutionResult, TeamError> {
        let start_time = Instant::now();

        let team = self
            .teams
            .find_team(team_id, tenant)
            .await
            .map_err(|e| TeamError::Store(e.to_string()))?
            .ok_or_else(|| TeamError::TeamNotFound(team_id.to_string()))?;

        if team.members.is_empty() {
            return Err(TeamError::NoValidAgents(team_id.to_string()));
        }

        let pattern = pattern_override.unwrap_or(team.structure);
        let members = order_members(&team, pattern);
        tracing::info!(
            "Team {} running {} with {} agents",
            team_id,
            pattern,
            members.len()
        );

        let mut context = Context::new();
        context.insert("task".into(), json!(task));
        context.insert("teamId".into(), json!(team_id));

        let mut run = TeamRun {
            agents: self.agents.as_ref(),
            tenant,
            task,
            context,
            members,
            transcript: Transcript::new(team_id),
            total_tokens: 0,
            total_cost: 0.0,
        };

        let outcome = match pattern {
            TeamStructure::Hierarchical => run.hierarchical().await,
            TeamStructure::Collaborative => run.collaborative().await,
            TeamStructure::Pipeline => run.pipeline().await,
            TeamStructure::Democratic => run.democratic().await,
        };

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::info!(
            "Team {} finished in {}ms ({} messages, {} tokens)",
            team_id,
            execution_time_ms,
            run.transcript.len(),
            run.total_tokens
        );

        Ok(TeamExecutionResult {
            success: true,
            output: outcome.output,
            agent_outputs: outcome.agent_outputs,
            messages: run.transcript.into_messages(),
            execution_time_ms,
            pattern,
            total_tokens: run.total_tokens,
            total_cost: run.total_cost,
            voting_results: outcome.voting_results,
        })
    }
}

/// Members in the order `pattern` visits them.
///
/// Hierarchical teams put the leader first; pipelines follow the configured
/// `pipelineOrder` and append anyone it leaves out.
pub fn order_members(team: &Team, pattern: TeamStructure) -> Vec<TeamMember> {
    match pattern {
        TeamStructure::Hierarchical => {
            let mut members = team.members.clone();
            if let Some(pos) = members.iter().position(TeamMember::is_leader) {
                let leader = members.remove(pos);
                members.insert(0, leader);
            }
            members
        }
        TeamStructure::Pipeline => {
            let mut members: Vec<TeamMember> = Vec::with_capacity(team.members.len());
            for id in &team.configuration.roles.pipeline_order {
                let listed = team.members.iter().find(|m| &m.agent_id == id);
                if let Some(member) = listed {
                    if !members.iter().any(|m| m.agent_id == member.agent_id) {
                        members.push(member.clone());
                    }
                }
            }
            for member in &team.members {
                if !members.iter().any(|m| m.agent_id == member.agent_id) {
                    members.push(member.clone());
                }
            }
            members
        }
        TeamStructure::Collaborative | TeamStructure::Democratic => team.members.clone(),
    }
}

/// What a protocol produced, before the shared bookkeeping is attached
struct Outcome {
    output: Value,
    agent_outputs: Value,
    voting_results: Option<VotingResults>,
}

/// Reply from one agent call
struct Reply {
    output: Value,
    tokens_used: u64,
    cost: f64,
}

/// State for a single `execute_team_task` call
struct TeamRun<'a> {
    agents: &'a dyn AgentRunner,
    tenant: &'a str,
    task: &'a str,
    context: Context,
    members: Vec<TeamMember>,
    transcript: Transcript,
    total_tokens: u64,
    total_cost: f64,
}

impl<'a> TeamRun<'a> {
    /// Ask one agent. Collaborator errors come back as an error record
    /// instead of failing the protocol.
    async fn ask(&self, member: &TeamMember, prompt: String) -> Reply {
        tracing::debug!(
            "[team {}] asking agent {}",
            self.transcript.team_id(),
            member.agent_id
        );

        match self
            .agents
            .run_agent(&member.agent_id, self.tenant, &prompt, &self.context)
            .await
        {
            Ok(run) => Reply {
                output: run.output,
                tokens_used: run.tokens_used,
                cost: run.cost,
            },
            Err(e) => {
                tracing::warn!(
                    "[team {}] agent {} failed: {}",
                    self.transcript.team_id(),
                    member.agent_id,
                    e
                );
                Reply {
                    output: json!({
                        "type": "error",
                        "message": e.to_string(),
                        "content": format!("Failed to execute agent {}", member.agent_name),
                    }),
                    tokens_used: 0,
                    cost: 0.0,
                }
            }
        }
    }

    fn absorb(&mut self, reply: &Reply) {
        self.total_tokens += reply.tokens_used;
        self.total_cost += reply.cost;
    }

    async fn hierarchical(&mut self) -> Outcome {
        let leader = self.members[0].clone();
        let workers: Vec<TeamMember> = self.members[1..].to_vec();

        let plan = self
            .ask(
                &leader,
                format!(
                    "You are the team leader. Analyze the following task and break it down into {} specific subtasks, one for each team member:\n\n{}\n\nFor each subtask, provide clear, individualized instructions. Format as a numbered list.",
                    workers.len(),
                    self.task
                ),
            )
            .await;
        self.absorb(&plan);
        self.transcript.record(AgentMessage::new(
            &leader.agent_id,
            format!("Leader Analysis: {}", plan.output),
        ));

        let subtasks = extract_subtasks(&content_of(&plan.output), workers.len());
        let replies = {
            let this = &*self;
            join_all(workers.iter().zip(&subtasks).map(|(worker, subtask)| {
                this.ask(
                    worker,
                    format!(
                        "You are {}, a team member. Execute this specific subtask:\n\n{}\n\nContext: {}",
                        worker.agent_name, subtask, this.task
                    ),
                )
            }))
            .await
        };

        let mut worker_outputs = Vec::with_capacity(replies.len());
        for (worker, reply) in workers.iter().zip(replies) {
            self.absorb(&reply);
            self.transcript.record(
                AgentMessage::new(
                    &worker.agent_id,
                    format!("{} Result: {}", worker.agent_name, reply.output),
                )
                .to(&leader.agent_id),
            );
            worker_outputs.push(reply.output);
        }

        let worker_outputs = Value::Array(worker_outputs);
        let synthesis = self
            .ask(
                &leader,
                format!(
                    "As the team leader, synthesize these worker results into a final output:\n\n{}",
                    pretty(&worker_outputs)
                ),
            )
            .await;
        self.absorb(&synthesis);
        self.transcript.record(AgentMessage::new(
            &leader.agent_id,
            format!("Final Synthesis: {}", synthesis.output),
        ));

        Outcome {
            output: synthesis.output.clone(),
            agent_outputs: json!({
                "leader": plan.output,
                "workers": worker_outputs,
                "final": synthesis.output,
            }),
            voting_results: None,
        }
    }

    async fn collaborative(&mut self) -> Outcome {
        let members = self.members.clone();
        let prompt = format!(
            "Working collaboratively with the team on this task:\n\n{}\n\nProvide your analysis and contribution.",
            self.task
        );

        let mut agent_outputs = Map::new();
        for member in &members {
            let reply = self.ask(member, prompt.clone()).await;
            self.absorb(&reply);
            self.transcript.record(AgentMessage::new(
                &member.agent_id,
                format!("{}: {}", member.agent_name, reply.output),
            ));
            agent_outputs.insert(member.agent_id.clone(), reply.output);
        }

        let agent_outputs = Value::Object(agent_outputs);
        let coordinator = &members[0];
        let synthesis = self
            .ask(
                coordinator,
                format!(
                    "Synthesize all team contributions into a unified response:\n\n{}",
                    pretty(&agent_outputs)
                ),
            )
            .await;
        self.absorb(&synthesis);
        self.transcript.record(AgentMessage::new(
            &coordinator.agent_id,
            format!("Synthesis: {}", synthesis.output),
        ));

        Outcome {
            output: synthesis.output,
            agent_outputs,
            voting_results: None,
        }
    }

    async fn pipeline(&mut self) -> Outcome {
        let members = self.members.clone();
        let last = members.len() - 1;

        let mut running = self.task.to_string();
        let mut agent_outputs = Map::new();
        for (i, member) in members.iter().enumerate() {
            let prompt = if i == 0 {
                format!(
                    "You are the first agent in the pipeline. Process the following task:\n\n{}",
                    running
                )
            } else if i == last {
                format!(
                    "You are the final agent in the pipeline. Finalize the output from the previous agent:\n\n{}",
                    running
                )
            } else {
                format!(
                    "You are agent {} in the pipeline. Process the output from the previous agent:\n\n{}",
                    i + 1,
                    running
                )
            };

            let reply = self.ask(member, prompt).await;
            self.absorb(&reply);
            running = content_of(&reply.output);

            let mut message = AgentMessage::new(
                &member.agent_id,
                format!("Pipeline Stage {}: {}", i + 1, reply.output),
            );
            if let Some(next) = members.get(i + 1) {
                message = message.to(&next.agent_id);
            }
            self.transcript.record(message);
            agent_outputs.insert(member.agent_id.clone(), reply.output);
        }

        Outcome {
            output: Value::String(running),
            agent_outputs: Value::Object(agent_outputs),
            voting_results: None,
        }
    }

    async fn democratic(&mut self) -> Outcome {
        let members = self.members.clone();
        let prompt = format!("Propose your solution to the following task:\n\n{}", self.task);

        let mut proposals = Vec::with_capacity(members.len());
        let mut agent_outputs = Map::new();
        for member in &members {
            let reply = self.ask(member, prompt.clone()).await;
            self.absorb(&reply);
            self.transcript.record(AgentMessage::new(
                &member.agent_id,
                format!("Proposal from {}: {}", member.agent_name, reply.output),
            ));
            agent_outputs.insert(member.agent_id.clone(), reply.output.clone());
            proposals.push(Proposal {
                agent_id: member.agent_id.clone(),
                agent_name: member.agent_name.clone(),
                proposal: reply.output,
            });
        }

        let ballot = voting_prompt(&proposals);
        let mut votes = Vec::with_capacity(members.len());
        for member in &members {
            let reply = self.ask(member, ballot.clone()).await;
            self.absorb(&reply);
            let vote = extract_vote_index(&reply.output, proposals.len());
            self.transcript
                .record(AgentMessage::new(&member.agent_id, format!("Vote: {}", vote)));
            votes.push(vote);
        }

        let winner_index = most_voted(&votes);
        let winner = proposals[winner_index].clone();
        tracing::debug!(
            "[team {}] votes {:?} elected proposal {}",
            self.transcript.team_id(),
            votes,
            winner_index
        );

        Outcome {
            output: winner.proposal.clone(),
            agent_outputs: Value::Object(agent_outputs),
            voting_results: Some(VotingResults {
                proposals,
                votes,
                winner_index,
                winner,
            }),
        }
    }
}

fn voting_prompt(proposals: &[Proposal]) -> String {
    let listed: Vec<String> = proposals
        .iter()
        .enumerate()
        .map(|(i, p)| format!("Proposal {} ({}):\n{}", i, p.agent_name, content_of(&p.proposal)))
        .collect();
    format!(
        "Review the following proposals and vote for the best one:\n\n{}\n\nReturn the index (0-based) of the best proposal.",
        listed.join("\n\n")
    )
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> Team {
        Team::new("t", "org", TeamStructure::Pipeline)
            .with_member(TeamMember::new("a", "researcher"))
            .with_member(TeamMember::new("b", "leader"))
            .with_member(TeamMember::new("c", "writer"))
    }

    fn ids(members: &[TeamMember]) -> Vec<&str> {
        members.iter().map(|m| m.agent_id.as_str()).collect()
    }

    #[test]
    fn leader_moves_to_the_front() {
        let members = order_members(&team(), TeamStructure::Hierarchical);
        assert_eq!(ids(&members), vec!["b", "a", "c"]);
    }

    #[test]
    fn first_member_leads_without_a_leader_tag() {
        let team = Team::new("t", "org", TeamStructure::Hierarchical)
            .with_member(TeamMember::new("x", "analyst"))
            .with_member(TeamMember::new("y", "analyst"));
        assert_eq!(ids(&order_members(&team, TeamStructure::Hierarchical)), vec!["x", "y"]);
    }

    #[test]
    fn leader_role_match_is_case_sensitive() {
        let team = Team::new("t", "org", TeamStructure::Hierarchical)
            .with_member(TeamMember::new("x", "analyst"))
            .with_member(TeamMember::new("y", "Leader"))
            .with_member(TeamMember::new("z", "LEADER"));
        assert_eq!(ids(&order_members(&team, TeamStructure::Hierarchical)), vec!["x", "y", "z"]);
    }

    #[test]
    fn pipeline_order_comes_first_and_skips_unknown_ids() {
        let team = team().with_pipeline_order(["c", "ghost", "a", "c"]);
        assert_eq!(ids(&order_members(&team, TeamStructure::Pipeline)), vec!["c", "a", "b"]);
    }

    #[test]
    fn other_patterns_keep_declared_order() {
        assert_eq!(ids(&order_members(&team(), TeamStructure::Democratic)), vec!["a", "b", "c"]);
        assert_eq!(
            ids(&order_members(&team(), TeamStructure::Collaborative)),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn ballot_lists_every_proposal() {
        let proposals = vec![
            Proposal {
                agent_id: "a".into(),
                agent_name: "Ada".into(),
                proposal: json!({"content": "ship it"}),
            },
            Proposal {
                agent_id: "b".into(),
                agent_name: "Bo".into(),
                proposal: json!("wait"),
            },
        ];
        let ballot = voting_prompt(&proposals);
        assert!(ballot.contains("Proposal 0 (Ada):\nship it"));
        assert!(ballot.contains("Proposal 1 (Bo):\nwait"));
        assert!(ballot.ends_with("Return the index (0-based) of the best proposal."));
    }
}
