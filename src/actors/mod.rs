//! Actor-based configuration distribution
//!
//! The dispatcher runs as an independent async task consuming commands from
//! an mpsc channel, which serializes event delivery: one change event is
//! dispatched to completion before the next is taken off the queue.
//!
//! ## Architecture Overview
//!
//! ```text
//!  configuration management          ┌──────────────────────┐
//!  (environment / mapping edits)     │  AgentCacheRegistry  │
//!            │                       └──────────▲───────────┘
//!            │ ChangeEvent                      │ snapshot
//!            ▼                                  │
//!  ┌──────────────────┐   one job per   ┌───────┴──────────┐
//!  │ DispatcherHandle ├────────────────▶│ UpdateDispatcher │
//!  └──────────────────┘   mpsc command  └───────┬──────────┘
//!                                               │ submit + bounded wait
//!                                       ┌───────▼──────────┐
//!                                       │   JobExecutor    │
//!                                       │ (bounded workers)│
//!                                       └───────┬──────────┘
//!                                               │ resolve + apply
//!                                       ┌───────▼──────────┐
//!                                       │ ConfigurationRe- │
//!                                       │ solver (seam)    │
//!                                       └──────────────────┘
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: the dispatcher has an mpsc command channel; `dispatch`
//!    carries a oneshot for callers that want to await completion
//! 2. **Jobs**: per-agent work runs on the executor pool, awaited one at a
//!    time with a deadline so a single stuck agent cannot hang an event

pub mod dispatcher;
pub mod messages;
