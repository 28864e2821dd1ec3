use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::ports::{PublishError, QueueError, StoreError};

/// Machine-readable detail for a rejected dependency set, suitable for an
/// API-level error response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyFault {
    /// Every dependency the task declared
    pub dependencies: Vec<Uuid>,
    /// Declared dependencies that do not exist in the task store
    pub missing: Vec<Uuid>,
    /// Declared dependencies whose `expires` precedes the task's `deadline`
    pub expiring: Vec<Uuid>,
}

impl DependencyFault {
    /// Whether any dependency failed validation.
    pub fn is_fault(&self) -> bool {
        !self.missing.is_empty() || !self.expiring.is_empty()
    }
}

impl fmt::Display for DependencyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "missing: {:?}, expiring before deadline: {:?}",
            self.missing, self.expiring
        )
    }
}

/// Errors surfaced by the dependency tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The submitted dependency set can never be satisfied. Reported to
    /// the creation caller; never retried automatically.
    #[error("task {task_id} declares unschedulable dependencies: {fault}")]
    InvalidDependencies {
        /// The task whose creation was rejected
        task_id: Uuid,
        /// Offending dependency sets
        fault: DependencyFault,
    },

    /// The requirement-edge store returned an empty page that still
    /// advertised a continuation on a limit-1 blocked check. The design
    /// depends on cheap, reliable emptiness signals; this must never be
    /// swallowed.
    #[error("requirement edge store broke the emptiness contract for task {task_id}")]
    StoreInvariant {
        /// Partition the inconsistent page came from
        task_id: Uuid,
    },

    /// Task or edge store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The pending-queue gateway rejected a submission. The task now has a
    /// pending run with no queue message; the caller must retry.
    #[error("pending message for run {run_id} of task {task_id} failed: {source}")]
    Queue {
        /// Task whose run could not be enqueued
        task_id: Uuid,
        /// Run index
        run_id: u32,
        /// Gateway error
        source: QueueError,
    },

    /// The event publisher rejected a notification.
    #[error("task-pending event for run {run_id} of task {task_id} failed: {source}")]
    Publish {
        /// Task whose event could not be published
        task_id: Uuid,
        /// Run index
        run_id: u32,
        /// Publisher error
        source: PublishError,
    },
}

impl TrackerError {
    /// The validation fault, when this error is a dependency rejection.
    pub fn dependency_fault(&self) -> Option<&DependencyFault> {
        match self {
            Self::InvalidDependencies { fault, .. } => Some(fault),
            _ => None,
        }
    }
}
