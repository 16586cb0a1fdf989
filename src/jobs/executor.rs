//! Bounded worker pool for update jobs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::trace;

use super::error::{UpdateError, UpdateResult};
use super::update::UpdateJob;

/// Bounded execution service for update jobs.
///
/// At most `workers` jobs recompute concurrently; submissions beyond that
/// queue on the internal semaphore inside their spawned task, so `submit`
/// itself never blocks the caller. Cloning is cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct JobExecutor {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl JobExecutor {
    pub fn new(workers: usize) -> Self {
        assert!(workers > 0, "executor needs at least one worker");
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Hand a job to the pool, returning a handle for bounded waiting.
    pub fn submit(&self, job: UpdateJob) -> JobHandle {
        let agent_id = job.agent_id();
        let permits = self.permits.clone();

        let task = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| UpdateError::Canceled("executor closed".to_string()))?;
            trace!(agent_id, "worker picked up update job");
            job.run().await
        });

        JobHandle { agent_id, task }
    }
}

/// Completion handle for one submitted job
pub struct JobHandle {
    agent_id: u64,
    task: JoinHandle<UpdateResult<()>>,
}

impl JobHandle {
    pub fn agent_id(&self) -> u64 {
        self.agent_id
    }

    /// Wait for the job to finish, at most `deadline` long.
    ///
    /// On timeout the handle is consumed but the job keeps running detached;
    /// its eventual result is discarded. A panicked or aborted worker task
    /// surfaces as [`UpdateError::Canceled`].
    pub async fn await_with_deadline(self, deadline: Duration) -> UpdateResult<()> {
        match time::timeout(deadline, self.task).await {
            Err(_elapsed) => Err(UpdateError::Timeout(deadline)),
            Ok(Err(join_err)) => Err(UpdateError::Canceled(join_err.to_string())),
            Ok(Ok(result)) => result,
        }
    }

    /// Best-effort cancellation of the underlying job.
    ///
    /// The dispatcher does not use this; it abandons timed-out jobs instead.
    /// Offered for collaborators that shut the pool down hard.
    pub fn abort(&self) {
        self.task.abort();
    }
}
