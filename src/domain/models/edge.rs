//! Dependency edge records.
//!
//! The blocked/unblocked decision is existence-based: a task is blocked
//! while at least one requirement edge row exists in its partition. Edges
//! are created and deleted with idempotent, partition-scoped operations
//! only, so retries never double-apply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::DependencyRelation;

/// "`dependent` is still waiting on `required`."
///
/// Partition key: `dependent`. Created once per declared dependency and
/// removed exactly once when that dependency is determined satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementEdge {
    /// The blocked task
    pub dependent: Uuid,
    /// The task it waits on
    pub required: Uuid,
    /// Row expiry, inherited from the dependent task
    pub expires: DateTime<Utc>,
}

/// "When `required` resolves, reconsider `dependent`."
///
/// Partition key: `required`. A fan-out index consumed at resolution time;
/// rows are never load-bearing for correctness, so removal is best-effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseEdge {
    /// The task whose resolution triggers reconsideration
    pub required: Uuid,
    /// The task to reconsider
    pub dependent: Uuid,
    /// Row expiry, inherited from the dependent task
    pub expires: DateTime<Utc>,
    /// The dependent's relation, used to filter non-completed resolutions
    pub relation: DependencyRelation,
}

/// One page of a partition-scoped edge query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgePage<E> {
    /// Rows in this page, at most the requested limit
    pub entries: Vec<E>,
    /// Opaque token resuming after the last entry, `None` when exhausted
    pub continuation: Option<String>,
}

impl<E> EdgePage<E> {
    /// An exhausted, empty page.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            continuation: None,
        }
    }
}
