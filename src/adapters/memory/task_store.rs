//! In-memory task store adapter.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::models::Task;
use crate::domain::ports::errors::StoreError;
use crate::domain::ports::TaskStore;

/// Task store backed by a process-local map.
///
/// `modify` applies the mutator under an exclusive lock, so the
/// conflict-retry loop a remote store needs collapses to a single apply
/// here. The optimistic-locking `version` field is still bumped on every
/// commit so tests can observe write counts.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a task record, as the surrounding creation flow would before
    /// invoking the tracker.
    pub async fn put(&self, task: Task) {
        self.tasks.write().await.insert(task.id, task);
    }

    /// Remove a task record, simulating expiry.
    pub async fn evict(&self, id: Uuid) {
        self.tasks.write().await.remove(&id);
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn modify(
        &self,
        id: Uuid,
        mutate: &(dyn for<'a> Fn(&'a mut Task) + Send + Sync),
    ) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(StoreError::TaskNotFound(id))?;
        mutate(task);
        task.version += 1;
        Ok(task.clone())
    }
}
