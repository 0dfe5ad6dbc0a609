use hubcore::{AgentMessage, TeamId};

/// Messages exchanged during one team execution. Each call owns its own
/// transcript and hands it back with the result.
#[derive(Debug, Clone)]
pub struct Transcript {
    team_id: TeamId,
    messages: Vec<AgentMessage>,
}

impl Transcript {
    pub fn new(team_id: impl Into<TeamId>) -> Self {
        Self {
            team_id: team_id.into(),
            messages: Vec::new(),
        }
    }

    pub fn team_id(&self) -> &str {
        &self.team_id
    }

    pub fn record(&mut self, message: AgentMessage) {
        tracing::trace!("[team {}] {} -> {:?}", self.team_id, message.from, message.to);
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[AgentMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<AgentMessage> {
        self.messages
    }
}
