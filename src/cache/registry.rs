//! Registry of all agents known to the hub

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use super::entry::AgentCacheEntry;

/// Concurrent map from agent id to its cache entry.
///
/// Registration and removal happen from connection handling, dispatch reads
/// happen from the update dispatcher. `snapshot` is copy-on-read: it clones
/// the entry `Arc`s and releases the lock before returning, so a dispatch
/// can take minutes without ever blocking registration.
#[derive(Debug, Default)]
pub struct AgentCacheRegistry {
    entries: RwLock<HashMap<u64, Arc<AgentCacheEntry>>>,
}

impl AgentCacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent, returning its cache entry.
    ///
    /// Registering an already-known agent returns the existing entry
    /// untouched, so its resolved configuration survives reconnects.
    pub async fn register(&self, agent_id: u64) -> Arc<AgentCacheEntry> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(agent_id)
            .or_insert_with(|| {
                debug!(agent_id, "registering agent in cache");
                Arc::new(AgentCacheEntry::new(agent_id))
            })
            .clone();
        entry
    }

    /// Remove an agent, returning its entry if it was registered.
    ///
    /// An update job already in flight for the removed agent keeps its own
    /// `Arc` and finishes harmlessly against the detached entry.
    pub async fn remove(&self, agent_id: u64) -> Option<Arc<AgentCacheEntry>> {
        let removed = self.entries.write().await.remove(&agent_id);
        if removed.is_some() {
            debug!(agent_id, "removed agent from cache");
        }
        removed
    }

    pub async fn get(&self, agent_id: u64) -> Option<Arc<AgentCacheEntry>> {
        self.entries.read().await.get(&agent_id).cloned()
    }

    /// Current entries, ordered by agent id.
    ///
    /// The lock is dropped before returning; entries registered or removed
    /// afterwards are not reflected in the snapshot.
    pub async fn snapshot(&self) -> Vec<Arc<AgentCacheEntry>> {
        let mut entries: Vec<_> = self.entries.read().await.values().cloned().collect();
        entries.sort_by_key(|entry| entry.agent_id());
        entries
    }

    /// Fast path for the dispatcher: skip all work when nobody is registered.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
