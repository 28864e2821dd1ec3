//! Dependency tracker service.
//!
//! Orchestrates edge bookkeeping at task-creation time, the resolution
//! cascade, and the blocked/unblocked decision. Blocked state is held as
//! an existence-counted edge set per task rather than a counter field:
//! the stores offer atomic per-row create/delete but no atomic decrement,
//! and existence-based counting stays correct under concurrent, retryable
//! deletes. There is no lock anywhere; every operation must tolerate
//! arbitrary interleaving and at-least-once re-invocation.

use chrono::Utc;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::error::{DependencyFault, TrackerError};
use crate::domain::models::{
    RequirementEdge, Resolution, ReverseEdge, Run, RunState, Task, TaskStatus, TrackerConfig,
};
use crate::domain::ports::{
    EventPublisher, PendingQueue, RequirementEdgeStore, ReverseEdgeStore, TaskStore,
};

/// Either a preloaded task or an identifier to load on demand.
#[derive(Debug)]
pub enum TaskRef {
    /// The caller already holds the record
    Loaded(Box<Task>),
    /// Load from the task store when needed
    Id(Uuid),
}

impl From<Task> for TaskRef {
    fn from(task: Task) -> Self {
        Self::Loaded(Box::new(task))
    }
}

impl From<Uuid> for TaskRef {
    fn from(id: Uuid) -> Self {
        Self::Id(id)
    }
}

/// How a single declared dependency came out of the classification pass.
enum DependencyOutcome {
    /// The required task does not exist
    Missing(Uuid),
    /// The required task expires before the dependent's deadline
    Expiring(Uuid),
    /// Already satisfies the relation; the requirement edge was pruned
    Satisfied,
    /// Still blocking
    Blocking,
}

/// Coordinates the blocked/unblocked lifecycle of tasks with declared
/// prerequisites.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use trellis::adapters::memory::{
///     MemoryEventPublisher, MemoryPendingQueue, MemoryRequirementEdges, MemoryReverseEdges,
///     MemoryTaskStore,
/// };
/// use trellis::domain::models::TrackerConfig;
/// use trellis::services::DependencyTracker;
///
/// let tracker = DependencyTracker::new(
///     Arc::new(MemoryTaskStore::new()),
///     Arc::new(MemoryRequirementEdges::new()),
///     Arc::new(MemoryReverseEdges::new()),
///     Arc::new(MemoryPendingQueue::new()),
///     Arc::new(MemoryEventPublisher::new()),
///     TrackerConfig::default(),
/// );
/// ```
pub struct DependencyTracker {
    tasks: Arc<dyn TaskStore>,
    requirements: Arc<dyn RequirementEdgeStore>,
    reverse: Arc<dyn ReverseEdgeStore>,
    queue: Arc<dyn PendingQueue>,
    publisher: Arc<dyn EventPublisher>,
    config: TrackerConfig,
}

impl DependencyTracker {
    /// Create a new tracker over the given ports.
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        requirements: Arc<dyn RequirementEdgeStore>,
        reverse: Arc<dyn ReverseEdgeStore>,
        queue: Arc<dyn PendingQueue>,
        publisher: Arc<dyn EventPublisher>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            tasks,
            requirements,
            reverse,
            queue,
            publisher,
            config,
        }
    }

    /// Record and validate the dependencies of a newly created task, and
    /// schedule it if nothing blocks it.
    ///
    /// Safe to re-invoke wholesale after a partial failure: edge creation
    /// ignores existing rows and the run append is guarded on an empty run
    /// history.
    ///
    /// # Errors
    ///
    /// [`TrackerError::InvalidDependencies`] when any dependency is
    /// missing or expires before this task's deadline; the edges created
    /// for a rejected task are harmless leftovers reclaimed by row expiry.
    #[instrument(skip(self, task), fields(task_id = %task.id), err)]
    pub async fn track_dependencies(&self, task: &Task) -> Result<(), TrackerError> {
        // Pass 1: record both edge kinds for every dependency.
        let creations = task.dependencies.iter().map(|&required| {
            let requirement = RequirementEdge {
                dependent: task.id,
                required,
                expires: task.expires,
            };
            let reverse_edge = ReverseEdge {
                required,
                dependent: task.id,
                expires: task.expires,
                relation: task.dependency_relation,
            };
            async move {
                self.requirements.insert(&requirement, true).await?;
                self.reverse.insert(&reverse_edge, true).await
            }
        });
        try_join_all(creations).await?;

        // Pass 2: classify every dependency against the relation, pruning
        // edges for dependencies that are already satisfied.
        let checks = task
            .dependencies
            .iter()
            .map(|&required| self.classify_dependency(task, required));
        let outcomes = try_join_all(checks).await?;

        let mut fault = DependencyFault {
            dependencies: task.dependencies.clone(),
            ..Default::default()
        };
        let mut any_satisfied = false;
        for outcome in outcomes {
            match outcome {
                DependencyOutcome::Missing(id) => fault.missing.push(id),
                DependencyOutcome::Expiring(id) => fault.expiring.push(id),
                DependencyOutcome::Satisfied => any_satisfied = true,
                DependencyOutcome::Blocking => {}
            }
        }

        if fault.is_fault() {
            warn!(task_id = %task.id, %fault, "rejecting task with unschedulable dependencies");
            return Err(TrackerError::InvalidDependencies {
                task_id: task.id,
                fault,
            });
        }

        // A task with no dependencies is schedulable outright; one that
        // pruned an edge this pass may have just lost its last blocker.
        // A dependency satisfied by a concurrent resolution instead of by
        // this pass is covered by that resolution's own cascade.
        let schedulable = task.dependencies.is_empty()
            || (any_satisfied && !self.is_blocked(task.id).await?);
        if schedulable {
            self.schedule_task(task.clone()).await?;
        }
        Ok(())
    }

    /// Cascade the resolution of `task_id` to its direct dependents.
    ///
    /// Precondition: the resolution is already durably recorded on the
    /// task itself. This walks the reverse-edge partition one page at a
    /// time, removes the requirement edges this resolution satisfies, and
    /// schedules dependents that became unblocked. One hop only: a newly
    /// scheduled dependent triggers its own cascade when it resolves.
    #[instrument(skip(self), err)]
    pub async fn resolve_task(
        &self,
        task_id: Uuid,
        resolution: Resolution,
    ) -> Result<(), TrackerError> {
        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .reverse
                .page_for_required(task_id, self.config.resolve_page_size, continuation.take())
                .await?;
            for edge in &page.entries {
                if !resolution.satisfies(edge.relation) {
                    // A failure or exception never satisfies an
                    // all-completed dependent; its edge stays.
                    continue;
                }
                self.unblock(edge.dependent, task_id).await?;
            }
            continuation = page.continuation;
            if continuation.is_none() {
                break;
            }
        }
        Ok(())
    }

    /// Whether at least one requirement edge still exists for `task_id`.
    ///
    /// Answered with a single limit-1 page. An empty page that still
    /// advertises a continuation means the store cannot be trusted for the
    /// emptiness signal every scheduling decision rests on, and surfaces
    /// as [`TrackerError::StoreInvariant`].
    pub async fn is_blocked(&self, task_id: Uuid) -> Result<bool, TrackerError> {
        let page = self
            .requirements
            .page_for_dependent(task_id, 1, None)
            .await?;
        if page.entries.is_empty() && page.continuation.is_some() {
            return Err(TrackerError::StoreInvariant { task_id });
        }
        Ok(!page.entries.is_empty())
    }

    /// Mark a task's initial run pending and notify downstream consumers.
    ///
    /// Returns `None` without mutating anything when the task does not
    /// exist (an expected race with a half-completed creation) or its
    /// deadline has passed. The run append is idempotent, so this call and
    /// `track_dependencies` may race to create run 0 and exactly one wins.
    /// The queue submission and event publish are both issued and both
    /// awaited; if either fails the whole operation fails and the caller
    /// must retry, because a pending task with no queue message is a stuck
    /// task.
    pub async fn schedule_task(
        &self,
        task: impl Into<TaskRef> + Send,
    ) -> Result<Option<TaskStatus>, TrackerError> {
        let task = match task.into() {
            TaskRef::Loaded(task) => *task,
            TaskRef::Id(id) => {
                let Some(task) = self.tasks.get(id).await? else {
                    // The dependent's record may not be fully written yet;
                    // its own creation pass will schedule it.
                    info!(task_id = %id, "task missing at schedule time; skipping");
                    return Ok(None);
                };
                task
            }
        };

        if task.deadline <= Utc::now() {
            debug!(task_id = %task.id, deadline = %task.deadline, "deadline passed; not scheduling");
            return Ok(None);
        }

        let scheduled = Utc::now();
        let task = self
            .tasks
            .modify(task.id, &move |task: &mut Task| {
                if task.runs.is_empty() {
                    task.runs.push(Run::pending(scheduled));
                }
            })
            .await?;

        let status = task.status();
        let run_pending = task
            .runs
            .first()
            .is_some_and(|run| run.state == RunState::Pending);
        if run_pending {
            let run_id = 0;
            let (queued, published) = tokio::join!(
                self.queue.put_pending_message(&task, run_id),
                self.publisher.task_pending(&status, run_id, &task.routes),
            );
            queued.map_err(|source| TrackerError::Queue {
                task_id: task.id,
                run_id,
                source,
            })?;
            published.map_err(|source| TrackerError::Publish {
                task_id: task.id,
                run_id,
                source,
            })?;
            info!(task_id = %task.id, run_id, "task pending");
        }
        Ok(Some(status))
    }

    /// Safety-net hook for a reconciliation sweep.
    ///
    /// Re-derives blocked state from the requirement partition and
    /// schedules the task if nothing blocks it, catching a cascade that
    /// was lost between its edge removal and its blocked re-check.
    pub async fn reconcile_blocked(
        &self,
        task_id: Uuid,
    ) -> Result<Option<TaskStatus>, TrackerError> {
        if self.is_blocked(task_id).await? {
            return Ok(None);
        }
        self.schedule_task(task_id).await
    }

    async fn classify_dependency(
        &self,
        task: &Task,
        required: Uuid,
    ) -> Result<DependencyOutcome, TrackerError> {
        let Some(required_task) = self.tasks.get(required).await? else {
            return Ok(DependencyOutcome::Missing(required));
        };
        if required_task.expires < task.deadline {
            return Ok(DependencyOutcome::Expiring(required));
        }
        if task.dependency_relation.satisfied_by(required_task.state()) {
            self.requirements.remove(task.id, required, true).await?;
            debug!(task_id = %task.id, dependency = %required, "pruned satisfied dependency");
            return Ok(DependencyOutcome::Satisfied);
        }
        Ok(DependencyOutcome::Blocking)
    }

    /// Remove the requirement edge satisfied by a resolution and schedule
    /// the dependent if that was its last blocker.
    async fn unblock(&self, dependent: Uuid, resolved: Uuid) -> Result<(), TrackerError> {
        self.requirements.remove(dependent, resolved, true).await?;
        // The reverse row is only a fan-out index; losing the cleanup is
        // harmless.
        if let Err(error) = self.reverse.remove(resolved, dependent, true).await {
            warn!(%dependent, %resolved, %error, "failed to prune reverse edge");
        }
        if self.is_blocked(dependent).await? {
            debug!(task_id = %dependent, "still blocked after removing requirement");
            return Ok(());
        }
        self.schedule_task(dependent).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        MemoryEventPublisher, MemoryPendingQueue, MemoryRequirementEdges, MemoryReverseEdges,
        MemoryTaskStore,
    };
    use crate::domain::models::{DependencyRelation, EdgePage, TaskState};
    use crate::domain::ports::errors::StoreError;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    struct Fixture {
        tasks: Arc<MemoryTaskStore>,
        requirements: Arc<MemoryRequirementEdges>,
        reverse: Arc<MemoryReverseEdges>,
        queue: Arc<MemoryPendingQueue>,
        publisher: Arc<MemoryEventPublisher>,
        tracker: DependencyTracker,
    }

    fn fixture() -> Fixture {
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
            TrackerConfig::default(),
        );
        Fixture {
            tasks,
            requirements,
            reverse,
            queue,
            publisher,
            tracker,
        }
    }

    fn task() -> Task {
        let now = Utc::now();
        Task::new(now + Duration::hours(1), now + Duration::days(1))
    }

    async fn completed_task(fixture: &Fixture) -> Task {
        let mut task = task();
        task.runs.push(Run {
            state: RunState::Completed,
            reason_created: crate::domain::models::ReasonCreated::Scheduled,
            scheduled: Utc::now(),
        });
        fixture.tasks.put(task.clone()).await;
        task
    }

    #[tokio::test]
    async fn test_no_dependencies_schedules_once() {
        let fixture = fixture();
        let task = task();
        fixture.tasks.put(task.clone()).await;

        fixture.tracker.track_dependencies(&task).await.unwrap();

        let stored = fixture.tasks.get(task.id).await.unwrap().unwrap();
        assert_eq!(stored.runs.len(), 1);
        assert_eq!(stored.state(), TaskState::Pending);
        assert_eq!(fixture.queue.messages().await.len(), 1);
        assert_eq!(fixture.publisher.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_dependency_is_rejected() {
        let fixture = fixture();
        let ghost = Uuid::new_v4();
        let task = task().with_dependency(ghost);
        fixture.tasks.put(task.clone()).await;

        let error = fixture.tracker.track_dependencies(&task).await.unwrap_err();
        let fault = error.dependency_fault().expect("validation fault");
        assert_eq!(fault.missing, vec![ghost]);
        assert!(fault.expiring.is_empty());
        assert_eq!(fault.dependencies, vec![ghost]);

        // No run was appended and nothing was announced.
        let stored = fixture.tasks.get(task.id).await.unwrap().unwrap();
        assert!(stored.runs.is_empty());
        assert!(fixture.queue.messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_expiring_dependency_is_rejected_independently() {
        let fixture = fixture();
        let now = Utc::now();
        // Expires an hour before the dependent's deadline.
        let short_lived = task().with_expires(now + Duration::hours(2));
        fixture.tasks.put(short_lived.clone()).await;
        let ghost = Uuid::new_v4();

        let task = task()
            .with_deadline(now + Duration::hours(3))
            .with_dependency(short_lived.id)
            .with_dependency(ghost);
        fixture.tasks.put(task.clone()).await;

        let error = fixture.tracker.track_dependencies(&task).await.unwrap_err();
        let fault = error.dependency_fault().expect("validation fault");
        assert_eq!(fault.missing, vec![ghost]);
        assert_eq!(fault.expiring, vec![short_lived.id]);
    }

    #[tokio::test]
    async fn test_already_satisfied_dependency_schedules_immediately() {
        let fixture = fixture();
        let done = completed_task(&fixture).await;

        let task = task().with_dependency(done.id);
        fixture.tasks.put(task.clone()).await;

        fixture.tracker.track_dependencies(&task).await.unwrap();

        assert!(!fixture.tracker.is_blocked(task.id).await.unwrap());
        assert!(fixture.requirements.is_empty().await);
        let stored = fixture.tasks.get(task.id).await.unwrap().unwrap();
        assert_eq!(stored.state(), TaskState::Pending);
        assert_eq!(fixture.queue.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unresolved_dependency_blocks() {
        let fixture = fixture();
        let pending = task();
        fixture.tasks.put(pending.clone()).await;

        let task = task().with_dependency(pending.id);
        fixture.tasks.put(task.clone()).await;

        fixture.tracker.track_dependencies(&task).await.unwrap();

        assert!(fixture.tracker.is_blocked(task.id).await.unwrap());
        let stored = fixture.tasks.get(task.id).await.unwrap().unwrap();
        assert!(stored.runs.is_empty());
        assert!(fixture.queue.messages().await.is_empty());
        // Both edge kinds were recorded for the cascade to find.
        assert_eq!(fixture.requirements.len().await, 1);
        assert_eq!(fixture.reverse.len().await, 1);
    }

    #[tokio::test]
    async fn test_track_dependencies_is_idempotent() {
        let fixture = fixture();
        let done = completed_task(&fixture).await;
        let pending = task();
        fixture.tasks.put(pending.clone()).await;

        let task = task()
            .with_dependency(done.id)
            .with_dependency(pending.id);
        fixture.tasks.put(task.clone()).await;

        fixture.tracker.track_dependencies(&task).await.unwrap();
        fixture.tracker.track_dependencies(&task).await.unwrap();

        // Same edge set and at most one initial run after the retry.
        assert_eq!(fixture.requirements.len().await, 1);
        assert_eq!(fixture.reverse.len().await, 2);
        let stored = fixture.tasks.get(task.id).await.unwrap().unwrap();
        assert!(stored.runs.len() <= 1);
    }

    #[tokio::test]
    async fn test_schedule_task_past_deadline_is_noop() {
        let fixture = fixture();
        let now = Utc::now();
        let task = task().with_deadline(now - Duration::minutes(1));
        fixture.tasks.put(task.clone()).await;

        let status = fixture.tracker.schedule_task(task.id).await.unwrap();
        assert!(status.is_none());

        let stored = fixture.tasks.get(task.id).await.unwrap().unwrap();
        assert!(stored.runs.is_empty());
        assert!(fixture.queue.messages().await.is_empty());
        assert!(fixture.publisher.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_schedule_task_missing_task_is_benign() {
        let fixture = fixture();
        let status = fixture.tracker.schedule_task(Uuid::new_v4()).await.unwrap();
        assert!(status.is_none());
    }

    #[tokio::test]
    async fn test_schedule_task_queue_failure_surfaces() {
        let fixture = fixture();
        let task = task();
        fixture.tasks.put(task.clone()).await;
        fixture.queue.set_failing(true);

        let error = fixture.tracker.schedule_task(task.id).await.unwrap_err();
        assert!(matches!(error, TrackerError::Queue { .. }));

        // The publish side was still issued and awaited; the run exists so
        // a retry of the whole call converges.
        assert_eq!(fixture.publisher.events().await.len(), 1);
        fixture.queue.set_failing(false);
        let status = fixture.tracker.schedule_task(task.id).await.unwrap();
        assert!(status.is_some());
        assert_eq!(fixture.queue.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_schedule_task_does_not_republish_claimed_run() {
        let fixture = fixture();
        let mut task = task();
        task.runs.push(Run {
            state: RunState::Running,
            reason_created: crate::domain::models::ReasonCreated::Scheduled,
            scheduled: Utc::now(),
        });
        fixture.tasks.put(task.clone()).await;

        let status = fixture.tracker.schedule_task(task.id).await.unwrap();
        assert_eq!(status.expect("status").state, TaskState::Running);
        assert!(fixture.queue.messages().await.is_empty());
        assert!(fixture.publisher.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_blocked_schedules_unblocked_task() {
        let fixture = fixture();
        let task = task();
        fixture.tasks.put(task.clone()).await;

        // No requirement rows exist, so the sweep schedules it.
        let status = fixture.tracker.reconcile_blocked(task.id).await.unwrap();
        assert!(status.is_some());
        assert_eq!(fixture.queue.messages().await.len(), 1);
    }

    /// Requirement store that reports an empty page with a continuation,
    /// violating the cheap-emptiness contract the blocked check rests on.
    struct BrokenRequirementEdges;

    #[async_trait]
    impl RequirementEdgeStore for BrokenRequirementEdges {
        async fn insert(&self, _: &RequirementEdge, _: bool) -> Result<(), StoreError> {
            Ok(())
        }

        async fn remove(&self, _: Uuid, _: Uuid, _: bool) -> Result<(), StoreError> {
            Ok(())
        }

        async fn page_for_dependent(
            &self,
            _: Uuid,
            _: usize,
            _: Option<String>,
        ) -> Result<EdgePage<RequirementEdge>, StoreError> {
            Ok(EdgePage {
                entries: Vec::new(),
                continuation: Some("phantom".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn test_inconsistent_emptiness_signal_is_fatal() {
        let fixture = fixture();
        let tracker = DependencyTracker::new(
            fixture.tasks.clone(),
            Arc::new(BrokenRequirementEdges),
            fixture.reverse.clone(),
            fixture.queue.clone(),
            fixture.publisher.clone(),
            TrackerConfig::default(),
        );

        let error = tracker.is_blocked(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(error, TrackerError::StoreInvariant { .. }));
    }

    #[tokio::test]
    async fn test_failed_resolution_ignores_all_completed_dependents() {
        let fixture = fixture();
        let blocking = task();
        fixture.tasks.put(blocking.clone()).await;

        let strict = task()
            .with_relation(DependencyRelation::AllCompleted)
            .with_dependency(blocking.id);
        fixture.tasks.put(strict.clone()).await;
        fixture.tracker.track_dependencies(&strict).await.unwrap();

        fixture
            .tracker
            .resolve_task(blocking.id, Resolution::Failed)
            .await
            .unwrap();

        // Terminal-blocked: the edge stays and nothing is scheduled.
        assert!(fixture.tracker.is_blocked(strict.id).await.unwrap());
        assert!(fixture.queue.messages().await.is_empty());
    }
}
