//! In-memory edge store adapters.
//!
//! Both stores keep rows in a `BTreeMap` keyed `(partition, secondary)` so
//! a partition scan is an ordered range and continuation tokens are simply
//! the last returned secondary key.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::models::{EdgePage, RequirementEdge, ReverseEdge};
use crate::domain::ports::errors::StoreError;
use crate::domain::ports::{RequirementEdgeStore, ReverseEdgeStore};

fn partition_bounds(
    partition: Uuid,
    continuation: Option<String>,
) -> Result<(Bound<(Uuid, Uuid)>, Bound<(Uuid, Uuid)>), StoreError> {
    let start = match continuation {
        Some(token) => {
            let after = Uuid::parse_str(&token)
                .map_err(|_| StoreError::InvalidContinuation(token))?;
            Bound::Excluded((partition, after))
        }
        None => Bound::Included((partition, Uuid::nil())),
    };
    let end = Bound::Included((partition, Uuid::from_u128(u128::MAX)));
    Ok((start, end))
}

fn page_rows<E: Clone>(
    rows: &BTreeMap<(Uuid, Uuid), E>,
    bounds: (Bound<(Uuid, Uuid)>, Bound<(Uuid, Uuid)>),
    limit: usize,
    secondary: impl Fn(&E) -> Uuid,
) -> EdgePage<E> {
    let limit = limit.max(1);
    let mut entries: Vec<E> = Vec::new();
    let mut continuation = None;
    for edge in rows.range(bounds).map(|(_, edge)| edge) {
        if entries.len() == limit {
            continuation = entries.last().map(|last| secondary(last).to_string());
            break;
        }
        entries.push(edge.clone());
    }
    EdgePage {
        entries,
        continuation,
    }
}

/// Requirement edges in a process-local ordered map, partitioned by the
/// blocked task.
#[derive(Default)]
pub struct MemoryRequirementEdges {
    rows: RwLock<BTreeMap<(Uuid, Uuid), RequirementEdge>>,
}

impl MemoryRequirementEdges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows across all partitions.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Whether the store holds no rows at all.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl RequirementEdgeStore for MemoryRequirementEdges {
    async fn insert(
        &self,
        edge: &RequirementEdge,
        ignore_if_exists: bool,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let key = (edge.dependent, edge.required);
        if rows.contains_key(&key) {
            if ignore_if_exists {
                return Ok(());
            }
            return Err(StoreError::RowExists(format!(
                "requirement {} -> {}",
                edge.dependent, edge.required
            )));
        }
        rows.insert(key, *edge);
        Ok(())
    }

    async fn remove(
        &self,
        dependent: Uuid,
        required: Uuid,
        ignore_if_absent: bool,
    ) -> Result<(), StoreError> {
        let removed = self.rows.write().await.remove(&(dependent, required));
        if removed.is_none() && !ignore_if_absent {
            return Err(StoreError::RowNotFound(format!(
                "requirement {dependent} -> {required}"
            )));
        }
        Ok(())
    }

    async fn page_for_dependent(
        &self,
        dependent: Uuid,
        limit: usize,
        continuation: Option<String>,
    ) -> Result<EdgePage<RequirementEdge>, StoreError> {
        let bounds = partition_bounds(dependent, continuation)?;
        let rows = self.rows.read().await;
        Ok(page_rows(&rows, bounds, limit, |edge| edge.required))
    }
}

/// Reverse edges in a process-local ordered map, partitioned by the
/// blocking task.
#[derive(Default)]
pub struct MemoryReverseEdges {
    rows: RwLock<BTreeMap<(Uuid, Uuid), ReverseEdge>>,
}

impl MemoryReverseEdges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows across all partitions.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Whether the store holds no rows at all.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl ReverseEdgeStore for MemoryReverseEdges {
    async fn insert(&self, edge: &ReverseEdge, ignore_if_exists: bool) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let key = (edge.required, edge.dependent);
        if rows.contains_key(&key) {
            if ignore_if_exists {
                return Ok(());
            }
            return Err(StoreError::RowExists(format!(
                "reverse {} <- {}",
                edge.required, edge.dependent
            )));
        }
        rows.insert(key, *edge);
        Ok(())
    }

    async fn remove(
        &self,
        required: Uuid,
        dependent: Uuid,
        ignore_if_absent: bool,
    ) -> Result<(), StoreError> {
        let removed = self.rows.write().await.remove(&(required, dependent));
        if removed.is_none() && !ignore_if_absent {
            return Err(StoreError::RowNotFound(format!(
                "reverse {required} <- {dependent}"
            )));
        }
        Ok(())
    }

    async fn page_for_required(
        &self,
        required: Uuid,
        limit: usize,
        continuation: Option<String>,
    ) -> Result<EdgePage<ReverseEdge>, StoreError> {
        let bounds = partition_bounds(required, continuation)?;
        let rows = self.rows.read().await;
        Ok(page_rows(&rows, bounds, limit, |edge| edge.dependent))
    }
}
