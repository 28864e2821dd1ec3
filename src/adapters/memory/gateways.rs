//! In-memory pending-queue and event-publisher adapters.
//!
//! Recording doubles for tests: every delivery is captured for assertion,
//! and either gateway can be switched into a failing mode to exercise the
//! not-silently-partial contract of scheduling.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::models::{Task, TaskStatus};
use crate::domain::ports::errors::{PublishError, QueueError};
use crate::domain::ports::{EventPublisher, PendingQueue};

/// A recorded pending-queue submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMessage {
    /// Task the message was for
    pub task_id: Uuid,
    /// Run index
    pub run_id: u32,
}

/// Pending-queue gateway that records submissions in memory.
#[derive(Default)]
pub struct MemoryPendingQueue {
    messages: Mutex<Vec<PendingMessage>>,
    failing: AtomicBool,
}

impl MemoryPendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent submission fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything submitted so far.
    pub async fn messages(&self) -> Vec<PendingMessage> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl PendingQueue for MemoryPendingQueue {
    async fn put_pending_message(&self, task: &Task, run_id: u32) -> Result<(), QueueError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(QueueError::Gateway("injected queue outage".to_string()));
        }
        self.messages.lock().await.push(PendingMessage {
            task_id: task.id,
            run_id,
        });
        Ok(())
    }
}

/// A recorded task-pending event.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    /// Status snapshot carried by the event
    pub status: TaskStatus,
    /// Run index
    pub run_id: u32,
    /// Routing keys forwarded from the task record
    pub routes: Vec<String>,
}

/// Event publisher that records notifications in memory.
#[derive(Default)]
pub struct MemoryEventPublisher {
    events: Mutex<Vec<PublishedEvent>>,
    failing: AtomicBool,
}

impl MemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything published so far.
    pub async fn events(&self) -> Vec<PublishedEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventPublisher for MemoryEventPublisher {
    async fn task_pending(
        &self,
        status: &TaskStatus,
        run_id: u32,
        routes: &[String],
    ) -> Result<(), PublishError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::Sink("injected publisher outage".to_string()));
        }
        self.events.lock().await.push(PublishedEvent {
            status: status.clone(),
            run_id,
            routes: routes.to_vec(),
        });
        Ok(())
    }
}
