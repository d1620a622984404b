//! Deployment task queue
//!
//! FIFO queue of pending snapshot loads with an admission set keyed by
//! `(tenant, timestamp)`. A key is admitted at most once per supervisor
//! lifetime; retries re-enter through a separate path that bypasses the
//! admission filter, so the set encodes "first seen by the scanner", not
//! "currently queued".

mod error;
mod manager;
mod task;

pub use error::QueueError;
pub use manager::TaskQueue;
pub use task::{SnapshotTask, TaskKey, TaskOutcome};
