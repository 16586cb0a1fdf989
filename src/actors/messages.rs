//! Message types for the update dispatcher
//!
//! ## Design Principles
//!
//! 1. **Events**: [`ChangeEvent`] is the inbound notification from the
//!    configuration-management subsystem; immutable and cloneable
//! 2. **Commands**: control messages sent to the dispatcher via mpsc, with
//!    oneshot channels where the caller wants an answer

use tokio::sync::oneshot;

use crate::cache::ConfigurationHolder;

/// Notification that centrally-edited configuration changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A specific environment was edited; agents resolved to it need a
    /// recomputation
    EnvironmentUpdate { environment_id: String },

    /// The agent-to-environment mappings were edited; any already-configured
    /// agent may now map somewhere else
    AgentMappingsUpdate,
}

impl ChangeEvent {
    pub fn environment_update(environment_id: impl Into<String>) -> Self {
        ChangeEvent::EnvironmentUpdate {
            environment_id: environment_id.into(),
        }
    }

    /// Short tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::EnvironmentUpdate { .. } => "environment-update",
            ChangeEvent::AgentMappingsUpdate => "agent-mappings-update",
        }
    }

    /// Whether this event affects an agent in the given resolved state.
    ///
    /// Eligibility is decided once, off a registry snapshot:
    /// - environment update: the holder is initialized and currently resolved
    ///   to the edited environment
    /// - mappings update: the holder is initialized (a mapping edit can
    ///   redirect any already-configured agent)
    ///
    /// Uninitialized holders are never selected; their first resolution has
    /// not happened yet, so there is nothing to refresh.
    pub fn selects(&self, holder: &ConfigurationHolder) -> bool {
        match self {
            ChangeEvent::EnvironmentUpdate { environment_id } => {
                holder.is_initialized() && holder.environment_id() == Some(environment_id.as_str())
            }
            ChangeEvent::AgentMappingsUpdate => holder.is_initialized(),
        }
    }
}

/// Commands that can be sent to the UpdateDispatcher
#[derive(Debug)]
pub enum DispatcherCommand {
    /// Dispatch a change event to all affected agents
    Dispatch {
        event: ChangeEvent,

        /// Acked once every selected agent was attempted; `None` for
        /// fire-and-forget delivery
        respond_to: Option<oneshot::Sender<()>>,
    },

    /// Get the dispatcher's counters
    GetStats {
        respond_to: oneshot::Sender<DispatcherStats>,
    },

    /// Gracefully shut down the dispatcher
    Shutdown,
}

/// Dispatcher counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Change events fully processed
    pub events_processed: u64,

    /// Update jobs submitted to the executor
    pub jobs_submitted: u64,

    /// Jobs that failed, timed out, or whose wait was canceled
    pub jobs_failed: u64,
}
