use std::time::Duration;

use tracing::trace;

/// Default per-job wait before the dispatcher abandons a recomputation
pub const DEFAULT_DISPATCH_DEADLINE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Number of workers in the update job pool
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Seconds the dispatcher waits on a single update job before moving on
    #[serde(default = "default_dispatch_deadline_secs")]
    pub dispatch_deadline_secs: u64,

    /// Environments known to the hub (used by the built-in static resolver)
    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,

    /// Agent-to-environment mappings (used by the built-in static resolver)
    #[serde(default)]
    pub agents: Vec<AgentMappingConfig>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct EnvironmentConfig {
    pub id: String,
    #[serde(default)]
    pub profiles: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AgentMappingConfig {
    pub agent_id: u64,
    pub environment: String,
}

impl Config {
    pub fn dispatch_deadline(&self) -> Duration {
        Duration::from_secs(self.dispatch_deadline_secs)
    }
}

fn default_workers() -> usize {
    4
}

fn default_dispatch_deadline_secs() -> u64 {
    DEFAULT_DISPATCH_DEADLINE.as_secs()
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
