//! Trellis - dependency-resolution and scheduling core for a distributed
//! task queue.
//!
//! Given a graph of tasks with declared prerequisite relationships, this
//! crate decides when a task becomes eligible to run and propagates that
//! decision to a pending-work queue and an event-notification channel. The
//! blocked/unblocked state of potentially millions of tasks is kept
//! eventually consistent under concurrent creation and resolution using
//! only idempotent, partition-scoped storage operations: no cross-entity
//! transactions, no global lock.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture
//! principles:
//!
//! - **Domain Layer** (`domain`): models, error taxonomy, and the ports
//!   through which external collaborators are reached
//! - **Service Layer** (`services`): the dependency tracker itself
//! - **Adapters** (`adapters`): in-memory port implementations
//! - **Infrastructure Layer** (`infrastructure`): config loading and
//!   logging setup
//!
//! The task store, both edge stores, the pending-queue gateway, and the
//! event publisher are external collaborators; production deployments
//! supply their own adapters for them.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use chrono::{Duration, Utc};
//! use trellis::adapters::memory::{
//!     MemoryEventPublisher, MemoryPendingQueue, MemoryRequirementEdges, MemoryReverseEdges,
//!     MemoryTaskStore,
//! };
//! use trellis::domain::models::{Task, TrackerConfig};
//! use trellis::services::DependencyTracker;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), trellis::TrackerError> {
//! let tasks = Arc::new(MemoryTaskStore::new());
//! let tracker = DependencyTracker::new(
//!     tasks.clone(),
//!     Arc::new(MemoryRequirementEdges::new()),
//!     Arc::new(MemoryReverseEdges::new()),
//!     Arc::new(MemoryPendingQueue::new()),
//!     Arc::new(MemoryEventPublisher::new()),
//!     TrackerConfig::default(),
//! );
//!
//! let now = Utc::now();
//! let task = Task::new(now + Duration::hours(1), now + Duration::days(1));
//! tasks.put(task.clone()).await;
//! tracker.track_dependencies(&task).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, DependencyRelation, LoggingConfig, Resolution, Run, RunState, Task, TaskState,
    TaskStatus, TrackerConfig,
};
pub use domain::ports::{
    EventPublisher, PendingQueue, PublishError, QueueError, RequirementEdgeStore,
    ReverseEdgeStore, StoreError, TaskStore,
};
pub use domain::{DependencyFault, TrackerError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{DependencyTracker, TaskRef};
