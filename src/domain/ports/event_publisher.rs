use crate::domain::models::TaskStatus;
use crate::domain::ports::errors::PublishError;
use async_trait::async_trait;

/// Port for the task-state-change notification channel.
///
/// Delivery is at-least-once, fire-and-forget to subscribers.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Announce that a run of a task became pending.
    ///
    /// `routes` is the opaque routing list from the task record, forwarded
    /// untouched.
    async fn task_pending(
        &self,
        status: &TaskStatus,
        run_id: u32,
        routes: &[String],
    ) -> Result<(), PublishError>;
}
