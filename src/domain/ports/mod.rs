//! Ports for the external collaborators of the dependency tracker.
//!
//! Everything this core touches (the task store, both edge stores, the
//! pending-queue gateway, and the event publisher) is reached through one
//! of these traits. Adapters live under `crate::adapters`.

pub mod edge_store;
pub mod errors;
pub mod event_publisher;
pub mod pending_queue;
pub mod task_store;

pub use edge_store::{RequirementEdgeStore, ReverseEdgeStore};
pub use errors::{PublishError, QueueError, StoreError};
pub use event_publisher::EventPublisher;
pub use pending_queue::PendingQueue;
pub use task_store::TaskStore;
