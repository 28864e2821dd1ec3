use crate::domain::models::Task;
use crate::domain::ports::errors::StoreError;
use async_trait::async_trait;
use uuid::Uuid;

/// Port for the external task store.
///
/// The store owns the task record's full lifecycle; this crate only loads
/// tasks and conditionally mutates them through [`TaskStore::modify`].
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Load a task by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Read-modify-write with optimistic concurrency.
    ///
    /// The implementation applies `mutate` to a loaded copy and commits,
    /// reloading and reapplying on write conflict until the commit lands.
    /// `mutate` must therefore be safe to run more than once. Returns the
    /// committed task, or [`StoreError::TaskNotFound`] if the ID is absent.
    async fn modify(
        &self,
        id: Uuid,
        mutate: &(dyn for<'a> Fn(&'a mut Task) + Send + Sync),
    ) -> Result<Task, StoreError>;
}
