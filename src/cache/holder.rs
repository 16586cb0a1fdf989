//! Resolved configuration state of a single agent

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::{Environment, ResolvedConfiguration};

/// Last-resolved configuration of one agent.
///
/// A holder starts out uninitialized (no environment, empty profile set) and
/// stays that way until the first successful recomputation applies a result.
/// After that point `initialized` never goes back to false.
///
/// Holders are mutated only by a completed update job; the dispatcher reads
/// them to decide which agents a change event affects.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationHolder {
    /// Environment the agent last resolved to, `None` before first resolution
    environment: Option<Environment>,

    /// Profile ids of the resolved environment, denormalized for fast
    /// membership tests
    profile_ids: HashSet<String>,

    /// False until the first successful resolution completes
    initialized: bool,

    /// When the last successful update was applied
    updated_at: Option<DateTime<Utc>>,
}

impl ConfigurationHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    /// Id of the resolved environment, if any.
    pub fn environment_id(&self) -> Option<&str> {
        self.environment.as_ref().map(|env| env.id.as_str())
    }

    pub fn profile_ids(&self) -> &HashSet<String> {
        &self.profile_ids
    }

    pub fn references_profile(&self, profile_id: &str) -> bool {
        self.profile_ids.contains(profile_id)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Replace the held configuration with a freshly recomputed one.
    ///
    /// This is the single mutation point. The whole replacement happens in
    /// one call, so a reader never observes an environment that does not
    /// match the profile set.
    pub fn apply(&mut self, resolved: ResolvedConfiguration) {
        self.environment = Some(resolved.environment);
        self.profile_ids = resolved.profile_ids;
        self.initialized = true;
        self.updated_at = Some(Utc::now());
    }
}
