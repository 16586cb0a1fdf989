//! Cache entry owning one agent's configuration state

use tokio::sync::RwLock;

use super::holder::ConfigurationHolder;

/// Per-agent container: agent identity plus its configuration holder.
///
/// Entries are shared via `Arc` between the registry, the dispatcher, and the
/// update job currently in flight for the agent (at most one at a time). The
/// holder sits behind an `RwLock` so the dispatcher can read it for eligibility
/// filtering while a late-finishing job writes its replacement.
#[derive(Debug)]
pub struct AgentCacheEntry {
    agent_id: u64,
    holder: RwLock<ConfigurationHolder>,
}

impl AgentCacheEntry {
    pub fn new(agent_id: u64) -> Self {
        Self {
            agent_id,
            holder: RwLock::new(ConfigurationHolder::new()),
        }
    }

    pub fn agent_id(&self) -> u64 {
        self.agent_id
    }

    pub fn holder(&self) -> &RwLock<ConfigurationHolder> {
        &self.holder
    }
}
