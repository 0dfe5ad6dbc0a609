use std::time::Duration;

/// Configuration for the workflow engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Node walks allowed to run at once; further executions wait in PENDING
    pub max_concurrent_executions: usize,
    pub event_buffer_size: usize,
    /// Per-node limit. `None` lets a node run for as long as its collaborator takes.
    pub node_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_executions: 16,
            event_buffer_size: 1000,
            node_timeout: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `HUB_MAX_CONCURRENT_EXECUTIONS`,
    /// `HUB_EVENT_BUFFER_SIZE` and `HUB_NODE_TIMEOUT_MS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(n) = parse_var::<usize>(&lookup, "HUB_MAX_CONCURRENT_EXECUTIONS") {
            config.max_concurrent_executions = n.max(1);
        }
        if let Some(n) = parse_var::<usize>(&lookup, "HUB_EVENT_BUFFER_SIZE") {
            config.event_buffer_size = n.max(1);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "HUB_NODE_TIMEOUT_MS") {
            config.node_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }

        config
    }

    pub fn with_max_concurrent_executions(mut self, n: usize) -> Self {
        self.max_concurrent_executions = n.max(1);
        self
    }

    pub fn with_node_timeout(mut self, timeout: Duration) -> Self {
        self.node_timeout = Some(timeout);
        self
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}
