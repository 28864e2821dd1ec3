use thiserror::Error;
use uuid::Uuid;

/// Edge/task store operation errors.
///
/// The storage client beneath these ports is expected to retry transient
/// faults itself; an error surfacing here is either a contract violation
/// (missing row, conflicting insert without the ignore flag) or an
/// exhausted backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Row already exists: {0}")]
    RowExists(String),

    #[error("Row not found: {0}")]
    RowNotFound(String),

    #[error("Invalid continuation token: {0}")]
    InvalidContinuation(String),

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Pending-queue gateway errors.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue gateway failure: {0}")]
    Gateway(String),
}

/// Event publisher errors.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Publisher failure: {0}")]
    Sink(String),
}
