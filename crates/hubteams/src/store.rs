use async_trait::async_trait;
use hubcore::{CollaboratorError, Team, TeamId, TeamStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local [`TeamStore`]
#[derive(Default)]
pub struct InMemoryTeamStore {
    teams: RwLock<HashMap<TeamId, Team>>,
}

impl InMemoryTeamStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_team(&self, team: Team) {
        tracing::info!("Storing team: {} ({} members)", team.id, team.members.len());
        self.teams.write().await.insert(team.id.clone(), team);
    }
}

#[async_trait]
impl TeamStore for InMemoryTeamStore {
    async fn find_team(&self, team_id: &str, tenant: &str) -> Result<Option<Team>, CollaboratorError> {
        let teams = self.teams.read().await;
        Ok(teams.get(team_id).filter(|t| t.tenant == tenant).cloned())
    }
}
