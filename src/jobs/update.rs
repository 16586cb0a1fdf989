//! Recomputation job for a single agent

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::actors::messages::ChangeEvent;
use crate::cache::AgentCacheEntry;
use crate::resolver::ConfigurationResolver;

use super::error::UpdateResult;

/// One unit of recomputation work, bound to one cache entry and the change
/// event that triggered it.
///
/// Jobs are single-use: the dispatcher builds a fresh job per submission and
/// `run` consumes it. The recomputation itself is delegated to the resolver;
/// the job's own responsibility is applying the result to exactly the bound
/// entry.
pub struct UpdateJob {
    entry: Arc<AgentCacheEntry>,
    event: ChangeEvent,
    resolver: Arc<dyn ConfigurationResolver>,
}

impl UpdateJob {
    pub fn new(
        entry: Arc<AgentCacheEntry>,
        event: ChangeEvent,
        resolver: Arc<dyn ConfigurationResolver>,
    ) -> Self {
        Self {
            entry,
            event,
            resolver,
        }
    }

    pub fn agent_id(&self) -> u64 {
        self.entry.agent_id()
    }

    /// Recompute the agent's configuration and apply it to the bound entry.
    ///
    /// Safe to abandon: if the dispatcher's wait times out, the job still
    /// finishes here and writes its result in a single lock section, so the
    /// entry is never left half-updated.
    #[instrument(skip(self), fields(agent_id = self.entry.agent_id(), event = self.event.kind()))]
    pub async fn run(self) -> UpdateResult<()> {
        let agent_id = self.entry.agent_id();

        let resolved = match &self.event {
            ChangeEvent::EnvironmentUpdate { environment_id } => {
                self.resolver
                    .resolve_environment(agent_id, environment_id)
                    .await?
            }
            ChangeEvent::AgentMappingsUpdate => self.resolver.resolve_mappings(agent_id).await?,
        };

        debug!(
            environment_id = %resolved.environment.id,
            profiles = resolved.profile_ids.len(),
            "applying recomputed configuration"
        );

        self.entry.holder().write().await.apply(resolved);

        Ok(())
    }
}
