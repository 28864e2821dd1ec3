//! Common test utilities for integration tests
//!
//! Provides the in-memory harness and task fixtures used across the
//! integration test files.

use chrono::{Duration, Utc};
use std::sync::Arc;

use trellis::adapters::memory::{
    MemoryEventPublisher, MemoryPendingQueue, MemoryRequirementEdges, MemoryReverseEdges,
    MemoryTaskStore,
};
use trellis::domain::models::{Task, TrackerConfig};
use trellis::services::DependencyTracker;

/// Tracker wired to in-memory adapters, with every adapter kept reachable
/// for assertions.
#[allow(dead_code)]
pub struct Harness {
    pub tasks: Arc<MemoryTaskStore>,
    pub requirements: Arc<MemoryRequirementEdges>,
    pub reverse: Arc<MemoryReverseEdges>,
    pub queue: Arc<MemoryPendingQueue>,
    pub publisher: Arc<MemoryEventPublisher>,
    pub tracker: DependencyTracker,
}

/// Harness with the default cascade page size.
pub fn harness() -> Harness {
    harness_with_page_size(TrackerConfig::default().resolve_page_size)
}

/// Harness with a custom cascade page size, for pagination tests.
#[allow(dead_code)]
pub fn harness_with_page_size(resolve_page_size: usize) -> Harness {
    let tasks = Arc::new(MemoryTaskStore::new());
    let requirements = Arc::new(MemoryRequirementEdges::new());
    let reverse = Arc::new(MemoryReverseEdges::new());
    let queue = Arc::new(MemoryPendingQueue::new());
    let publisher = Arc::new(MemoryEventPublisher::new());
    let tracker = DependencyTracker::new(
        tasks.clone(),
        requirements.clone(),
        reverse.clone(),
        queue.clone(),
        publisher.clone(),
        TrackerConfig { resolve_page_size },
    );
    Harness {
        tasks,
        requirements,
        reverse,
        queue,
        publisher,
        tracker,
    }
}

/// A task with an hour of deadline headroom and a day of record life.
pub fn task() -> Task {
    let now = Utc::now();
    Task::new(now + Duration::hours(1), now + Duration::days(1))
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
