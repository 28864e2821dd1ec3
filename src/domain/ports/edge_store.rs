use crate::domain::models::{EdgePage, RequirementEdge, ReverseEdge};
use crate::domain::ports::errors::StoreError;
use async_trait::async_trait;
use uuid::Uuid;

/// Port for the requirement-edge store, partitioned by the blocked task.
///
/// Existence of a row means the dependent task is still waiting on the
/// required task. All mutations are keyed by the edge's natural identity
/// so retried calls never double-apply.
#[async_trait]
pub trait RequirementEdgeStore: Send + Sync {
    /// Create an edge. With `ignore_if_exists`, creating an edge that is
    /// already present succeeds without touching the row.
    async fn insert(&self, edge: &RequirementEdge, ignore_if_exists: bool)
        -> Result<(), StoreError>;

    /// Remove the edge `(dependent, required)`. With `ignore_if_absent`,
    /// removing a missing edge succeeds.
    async fn remove(
        &self,
        dependent: Uuid,
        required: Uuid,
        ignore_if_absent: bool,
    ) -> Result<(), StoreError>;

    /// One page of the partition of edges still blocking `dependent`.
    ///
    /// Contract: a query with a small limit against an empty partition must
    /// reliably return an empty page with no continuation. The blocked
    /// check depends on this cheap-emptiness guarantee; substrates that
    /// cannot provide it must substitute a counter with the same observable
    /// behavior.
    async fn page_for_dependent(
        &self,
        dependent: Uuid,
        limit: usize,
        continuation: Option<String>,
    ) -> Result<EdgePage<RequirementEdge>, StoreError>;
}

/// Port for the reverse-edge store, partitioned by the blocking task.
///
/// Lets a resolution find every task waiting on it without a full scan.
/// Rows are read-only after creation except for best-effort cleanup.
#[async_trait]
pub trait ReverseEdgeStore: Send + Sync {
    /// Create an edge. With `ignore_if_exists`, creating an edge that is
    /// already present succeeds without touching the row.
    async fn insert(&self, edge: &ReverseEdge, ignore_if_exists: bool) -> Result<(), StoreError>;

    /// Remove the edge `(required, dependent)`. With `ignore_if_absent`,
    /// removing a missing edge succeeds.
    async fn remove(
        &self,
        required: Uuid,
        dependent: Uuid,
        ignore_if_absent: bool,
    ) -> Result<(), StoreError>;

    /// One page of the partition of tasks waiting on `required`.
    async fn page_for_required(
        &self,
        required: Uuid,
        limit: usize,
        continuation: Option<String>,
    ) -> Result<EdgePage<ReverseEdge>, StoreError>;
}
