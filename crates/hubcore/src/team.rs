use crate::TenantId;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TeamId = String;
pub type AgentId = String;

/// Role tag that marks the hierarchical leader
pub const LEADER_ROLE: &str = "leader";

/// Coordination protocol a team runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamStructure {
    Hierarchical,
    Collaborative,
    Pipeline,
    Democratic,
}

impl TeamStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamStructure::Hierarchical => "HIERARCHICAL",
            TeamStructure::Collaborative => "COLLABORATIVE",
            TeamStructure::Pipeline => "PIPELINE",
            TeamStructure::Democratic => "DEMOCRATIC",
        }
    }
}

impl fmt::Display for TeamStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamStructure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HIERARCHICAL" => Ok(TeamStructure::Hierarchical),
            "COLLABORATIVE" => Ok(TeamStructure::Collaborative),
            "PIPELINE" => Ok(TeamStructure::Pipeline),
            "DEMOCRATIC" => Ok(TeamStructure::Democratic),
            other => Err(format!("Unknown team structure: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub tenant: TenantId,
    pub name: String,
    pub structure: TeamStructure,
    pub members: Vec<TeamMember>,
    #[serde(default)]
    pub configuration: TeamConfiguration,
}

impl Team {
    pub fn new(
        id: impl Into<TeamId>,
        tenant: impl Into<TenantId>,
        structure: TeamStructure,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            tenant: tenant.into(),
            structure,
            members: Vec::new(),
            configuration: TeamConfiguration::default(),
        }
    }

    pub fn with_member(mut self, member: TeamMember) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_pipeline_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<AgentId>,
    {
        self.configuration.roles.pipeline_order = order.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub agent_id: AgentId,
    pub agent_name: String,
    pub role: String,
}

impl TeamMember {
    pub fn new(agent_id: impl Into<AgentId>, role: impl Into<String>) -> Self {
        let agent_id = agent_id.into();
        Self {
            agent_name: agent_id.clone(),
            agent_id,
            role: role.into(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.agent_name = name.into();
        self
    }

    pub fn is_leader(&self) -> bool {
        self.role == LEADER_ROLE
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamConfiguration {
    #[serde(default)]
    pub roles: RolesConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolesConfig {
    /// Explicit agent order for pipeline teams
    #[serde(default)]
    pub pipeline_order: Vec<AgentId>,
}

/// One entry of a team execution transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub from: AgentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<AgentId>,
    pub content: String,
    pub timestamp: String,
}

impl AgentMessage {
    pub fn new(from: impl Into<AgentId>, content: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: None,
            content: content.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn to(mut self, to: impl Into<AgentId>) -> Self {
        self.to = Some(to.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamExecutionResult {
    pub success: bool,
    pub output: serde_json::Value,
    pub agent_outputs: serde_json::Value,
    pub messages: Vec<AgentMessage>,
    pub execution_time_ms: u64,
    pub pattern: TeamStructure,
    pub total_tokens: u64,
    pub total_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_results: Option<VotingResults>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub agent_id: AgentId,
    pub agent_name: String,
    pub proposal: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingResults {
    pub proposals: Vec<Proposal>,
    pub votes: Vec<usize>,
    pub winner_index: usize,
    pub winner: Proposal,
}
