//! Per-agent configuration cache
//!
//! The cache is the authoritative server-side record of what every connected
//! agent is currently configured with:
//!
//! - [`ConfigurationHolder`]: the resolved state of a single agent
//! - [`AgentCacheEntry`]: agent identity plus its holder
//! - [`AgentCacheRegistry`]: the concurrent map of all registered agents
//!
//! Entries are shared via `Arc` between the registry, the dispatcher, and
//! in-flight update jobs. The registry hands out copy-on-read snapshots so a
//! dispatch never holds the registry lock while waiting on jobs.

pub mod entry;
pub mod holder;
pub mod registry;

pub use entry::AgentCacheEntry;
pub use holder::ConfigurationHolder;
pub use registry::AgentCacheRegistry;
