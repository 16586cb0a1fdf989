//! Error types for update job execution

use std::fmt;
use std::time::Duration;

use crate::resolver::ResolveError;

/// Result type alias for update job execution
pub type UpdateResult<T> = Result<T, UpdateError>;

/// Ways a single agent's recomputation can fail from the dispatcher's view
///
/// All variants are handled identically by the dispatcher: logged with the
/// affected agent and event, never propagated to the event publisher.
#[derive(Debug)]
pub enum UpdateError {
    /// The bounded wait on the job handle exceeded the deadline; the job
    /// itself keeps running detached
    Timeout(Duration),

    /// The job ran and reported a recomputation failure
    Failed(String),

    /// Waiting on the job was cut short by the runtime (the worker task
    /// panicked or was aborted)
    Canceled(String),
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateError::Timeout(deadline) => {
                write!(f, "update job not finished after {:?}", deadline)
            }
            UpdateError::Failed(msg) => write!(f, "update job failed: {}", msg),
            UpdateError::Canceled(msg) => write!(f, "waiting for update job canceled: {}", msg),
        }
    }
}

impl std::error::Error for UpdateError {}

impl From<ResolveError> for UpdateError {
    fn from(err: ResolveError) -> Self {
        UpdateError::Failed(err.to_string())
    }
}
