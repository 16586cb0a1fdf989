//! Update jobs and their bounded executor
//!
//! A change event never recomputes configurations on the dispatcher's own
//! task. Instead, one [`UpdateJob`] per affected agent is handed to the
//! [`JobExecutor`], a bounded tokio worker pool, and the dispatcher waits on
//! the returned [`JobHandle`] with a deadline. A job that outlives the wait
//! keeps running detached; its late result is applied last-writer-wins.

pub mod error;
pub mod executor;
pub mod update;

pub use error::{UpdateError, UpdateResult};
pub use executor::{JobExecutor, JobHandle};
pub use update::UpdateJob;
