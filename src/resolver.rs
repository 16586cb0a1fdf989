//! Configuration recomputation seam
//!
//! Recomputing an agent's configuration (resolving an environment and its
//! profiles into concrete instrumentation rules) belongs to the
//! instrumentation-management subsystem. This module only defines the seam
//! the update jobs call through, plus a static in-process implementation
//! backed by the hub config file, used by the demo binary and the tests.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use crate::config::Config;
use crate::{Environment, ResolvedConfiguration};

/// Result type alias for resolver operations
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors a resolver can report back to an update job
#[derive(Debug)]
pub enum ResolveError {
    /// The requested environment id is not known
    UnknownEnvironment(String),

    /// The agent has no environment mapped to it
    NoMapping(u64),

    /// The resolver's backing subsystem failed
    Backend(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UnknownEnvironment(id) => write!(f, "unknown environment '{}'", id),
            ResolveError::NoMapping(agent_id) => {
                write!(f, "no environment mapped for agent {}", agent_id)
            }
            ResolveError::Backend(msg) => write!(f, "resolver backend error: {}", msg),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Trait for the recomputation capability consumed by update jobs
///
/// Implementations must be `Send + Sync` as jobs run on the worker pool.
/// Both methods return the complete freshly-resolved configuration for the
/// agent; the job applies it to the agent's cache entry.
#[async_trait]
pub trait ConfigurationResolver: Send + Sync {
    /// Recompute the agent's configuration against a specific environment.
    ///
    /// Called for environment-update events, where the affected entries are
    /// already known to resolve to `environment_id`.
    async fn resolve_environment(
        &self,
        agent_id: u64,
        environment_id: &str,
    ) -> ResolveResult<ResolvedConfiguration>;

    /// Recompute the agent's configuration from its current mapping.
    ///
    /// Called for mapping-update events, where the agent may now map to a
    /// different environment than the one it was resolved to.
    async fn resolve_mappings(&self, agent_id: u64) -> ResolveResult<ResolvedConfiguration>;
}

/// Resolver backed by an in-memory environment table and agent mapping
///
/// Suitable for the demo binary and for tests; a production deployment
/// plugs its instrumentation-management subsystem in behind
/// [`ConfigurationResolver`] instead.
#[derive(Debug, Default)]
pub struct StaticResolver {
    environments: RwLock<HashMap<String, Environment>>,
    mappings: RwLock<HashMap<u64, String>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resolver from the hub config file's environment and agent tables.
    pub fn from_config(config: &Config) -> Self {
        let environments = config
            .environments
            .iter()
            .map(|env| {
                (
                    env.id.clone(),
                    Environment::new(env.id.clone(), env.profiles.iter().cloned()),
                )
            })
            .collect();

        let mappings = config
            .agents
            .iter()
            .map(|agent| (agent.agent_id, agent.environment.clone()))
            .collect();

        Self {
            environments: RwLock::new(environments),
            mappings: RwLock::new(mappings),
        }
    }

    /// Publish (or replace) an environment.
    pub async fn publish_environment(&self, environment: Environment) {
        trace!(environment_id = %environment.id, "publishing environment");
        self.environments
            .write()
            .await
            .insert(environment.id.clone(), environment);
    }

    /// Map an agent to an environment id.
    pub async fn map_agent(&self, agent_id: u64, environment_id: impl Into<String>) {
        self.mappings
            .write()
            .await
            .insert(agent_id, environment_id.into());
    }

    async fn lookup(&self, environment_id: &str) -> ResolveResult<ResolvedConfiguration> {
        let environments = self.environments.read().await;
        let environment = environments
            .get(environment_id)
            .ok_or_else(|| ResolveError::UnknownEnvironment(environment_id.to_string()))?;
        Ok(ResolvedConfiguration::from_environment(environment.clone()))
    }
}

#[async_trait]
impl ConfigurationResolver for StaticResolver {
    async fn resolve_environment(
        &self,
        agent_id: u64,
        environment_id: &str,
    ) -> ResolveResult<ResolvedConfiguration> {
        trace!(agent_id, environment_id, "resolving environment");
        self.lookup(environment_id).await
    }

    async fn resolve_mappings(&self, agent_id: u64) -> ResolveResult<ResolvedConfiguration> {
        let environment_id = self
            .mappings
            .read()
            .await
            .get(&agent_id)
            .cloned()
            .ok_or(ResolveError::NoMapping(agent_id))?;

        trace!(agent_id, %environment_id, "resolving agent mapping");
        self.lookup(&environment_id).await
    }
}
