//! UpdateDispatcher - applies change events to the agent cache
//!
//! The orchestration core: subscribes to configuration-change events, selects
//! the affected cache entries off a registry snapshot, submits one update job
//! per selected entry, and waits on each with a deadline.
//!
//! ## Message Flow
//!
//! ```text
//! ChangeEvent → snapshot registry → filter eligible → submit job → bounded wait
//!                                                         │ (per entry, in order)
//!                                                         └── failure/timeout: log, continue
//! ```
//!
//! ## Why sequential bounded waiting
//!
//! At most one recomputation is in flight per event, which bounds the
//! resource footprint and gives a hard upper latency of
//! `eligible × deadline` per event. It also makes the dispatcher the sole
//! sequencer of mutations: no two events, and no two jobs of one event, race
//! on the same entry's holder.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument, trace, warn};

use crate::cache::{AgentCacheEntry, AgentCacheRegistry};
use crate::config::DEFAULT_DISPATCH_DEADLINE;
use crate::jobs::{JobExecutor, UpdateJob};
use crate::resolver::ConfigurationResolver;

use super::messages::{ChangeEvent, DispatcherCommand, DispatcherStats};

/// Actor that keeps the agent cache consistent with configuration edits
///
/// One dispatcher serves the whole registry. Its command channel serializes
/// event delivery: an event is dispatched to completion before the next one
/// is taken off the queue.
pub struct UpdateDispatcher {
    /// The authoritative set of known agents
    registry: Arc<AgentCacheRegistry>,

    /// Bounded pool the update jobs run on
    executor: JobExecutor,

    /// Recomputation capability handed to every job
    resolver: Arc<dyn ConfigurationResolver>,

    /// Command receiver
    command_rx: mpsc::Receiver<DispatcherCommand>,

    /// Per-job wait bound before a job is abandoned
    deadline: Duration,

    /// Counters exposed through GetStats
    stats: DispatcherStats,
}

impl UpdateDispatcher {
    pub fn new(
        registry: Arc<AgentCacheRegistry>,
        executor: JobExecutor,
        resolver: Arc<dyn ConfigurationResolver>,
        command_rx: mpsc::Receiver<DispatcherCommand>,
        deadline: Duration,
    ) -> Self {
        Self {
            registry,
            executor,
            resolver,
            command_rx,
            deadline,
            stats: DispatcherStats::default(),
        }
    }

    /// Run the actor's main loop until shutdown or channel closure.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!(deadline = ?self.deadline, "starting update dispatcher");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                DispatcherCommand::Dispatch { event, respond_to } => {
                    self.on_event(event).await;
                    if let Some(tx) = respond_to {
                        let _ = tx.send(());
                    }
                }

                DispatcherCommand::GetStats { respond_to } => {
                    let _ = respond_to.send(self.stats.clone());
                }

                DispatcherCommand::Shutdown => {
                    debug!("received shutdown command");
                    break;
                }
            }
        }

        debug!("update dispatcher stopped");
    }

    /// Dispatch one change event to every affected agent.
    ///
    /// Never fails: per-agent failures are logged and counted, nothing
    /// propagates back to the event publisher.
    #[instrument(skip(self), fields(event = event.kind()))]
    async fn on_event(&mut self, event: ChangeEvent) {
        if self.registry.is_empty().await {
            trace!("no agents registered, nothing to update");
            self.stats.events_processed += 1;
            return;
        }

        let selected = self.select_affected(&event).await;
        if selected.is_empty() {
            debug!("no registered agent affected by event");
            self.stats.events_processed += 1;
            return;
        }

        debug!(affected = selected.len(), "recomputing agent configurations");

        for entry in selected {
            let agent_id = entry.agent_id();
            let job = UpdateJob::new(entry, event.clone(), self.resolver.clone());
            let handle = self.executor.submit(job);
            self.stats.jobs_submitted += 1;

            match handle.await_with_deadline(self.deadline).await {
                Ok(()) => trace!(agent_id, "agent configuration updated"),
                Err(err) => {
                    // one agent's failure must not stop the others
                    self.stats.jobs_failed += 1;
                    warn!(agent_id, event = event.kind(), "update failed: {err}");
                }
            }
        }

        self.stats.events_processed += 1;
    }

    /// Decide eligibility once, off the current registry snapshot.
    ///
    /// Entries whose state changes between snapshot and submission are not
    /// re-checked; the recomputation itself works on fresh data anyway.
    async fn select_affected(&self, event: &ChangeEvent) -> Vec<Arc<AgentCacheEntry>> {
        let mut selected = Vec::new();
        for entry in self.registry.snapshot().await {
            let affected = event.selects(&*entry.holder().read().await);
            if affected {
                selected.push(entry);
            }
        }
        selected
    }
}

/// Handle for the update dispatcher
///
/// Cloneable; all clones feed the same command queue.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    sender: mpsc::Sender<DispatcherCommand>,
}

impl DispatcherHandle {
    /// Spawn a dispatcher with the default one-minute deadline.
    pub fn spawn(
        registry: Arc<AgentCacheRegistry>,
        executor: JobExecutor,
        resolver: Arc<dyn ConfigurationResolver>,
    ) -> Self {
        Self::spawn_with_deadline(registry, executor, resolver, DEFAULT_DISPATCH_DEADLINE)
    }

    /// Spawn a dispatcher with an explicit per-job deadline.
    pub fn spawn_with_deadline(
        registry: Arc<AgentCacheRegistry>,
        executor: JobExecutor,
        resolver: Arc<dyn ConfigurationResolver>,
        deadline: Duration,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = UpdateDispatcher::new(registry, executor, resolver, cmd_rx, deadline);
        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Deliver an event and wait until every affected agent was attempted.
    ///
    /// The result only reflects whether the dispatcher is still alive; job
    /// failures never surface here.
    pub async fn dispatch(&self, event: ChangeEvent) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DispatcherCommand::Dispatch {
                event,
                respond_to: Some(tx),
            })
            .await
            .context("failed to send Dispatch command")?;

        rx.await.context("dispatcher dropped the dispatch ack")?;
        Ok(())
    }

    /// Deliver an event without waiting for the dispatch to finish.
    pub async fn notify(&self, event: ChangeEvent) -> Result<()> {
        self.sender
            .send(DispatcherCommand::Dispatch {
                event,
                respond_to: None,
            })
            .await
            .context("failed to send Dispatch command")?;
        Ok(())
    }

    /// Get the dispatcher's counters.
    pub async fn stats(&self) -> Result<DispatcherStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DispatcherCommand::GetStats { respond_to: tx })
            .await
            .context("failed to send GetStats command")?;

        rx.await.context("failed to receive stats")
    }

    /// Gracefully shut down the dispatcher.
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(DispatcherCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
