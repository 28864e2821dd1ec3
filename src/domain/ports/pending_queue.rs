use crate::domain::models::Task;
use crate::domain::ports::errors::QueueError;
use async_trait::async_trait;

/// Port for the pending-work queue gateway.
///
/// Delivery is at-least-once; workers deduplicate on claim. A pending task
/// with no queue message is a stuck task, so callers must treat a failed
/// submission as a failure of the whole scheduling operation and retry.
#[async_trait]
pub trait PendingQueue: Send + Sync {
    /// Enqueue run `run_id` of `task` for the worker pool to claim.
    async fn put_pending_message(&self, task: &Task, run_id: u32) -> Result<(), QueueError>;
}
