//! Queue error types

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue is closed")]
    Closed,
}
