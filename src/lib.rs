pub mod actors;
pub mod cache;
pub mod config;
pub mod jobs;
pub mod resolver;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A centrally-edited bundle of instrumentation profile references.
///
/// Environments are immutable once published: editing one produces a new
/// `Environment` value under the same logical id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Opaque unique identifier
    pub id: String,

    /// Ids of the profiles this environment references
    pub profile_ids: HashSet<String>,
}

impl Environment {
    pub fn new(id: impl Into<String>, profile_ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            id: id.into(),
            profile_ids: profile_ids.into_iter().collect(),
        }
    }
}

/// Output of a configuration recomputation for a single agent.
///
/// Produced by a [`resolver::ConfigurationResolver`] and applied to the
/// agent's [`cache::ConfigurationHolder`] by a completed update job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfiguration {
    /// The environment the agent resolved to
    pub environment: Environment,

    /// Profile ids referenced by the environment, denormalized so callers
    /// can do membership tests without walking the environment
    pub profile_ids: HashSet<String>,
}

impl ResolvedConfiguration {
    /// Build a resolved configuration straight from an environment.
    pub fn from_environment(environment: Environment) -> Self {
        let profile_ids = environment.profile_ids.clone();
        Self {
            environment,
            profile_ids,
        }
    }
}
