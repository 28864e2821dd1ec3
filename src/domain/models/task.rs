//! Task domain model.
//!
//! Tasks are discrete units of work submitted to the queue. Declared
//! prerequisite edges between them form a DAG; this crate decides when a
//! task's initial run may become pending.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Policy governing what counts as "satisfied" for a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyRelation {
    /// Every dependency must reach `completed`.
    AllCompleted,
    /// Every dependency must reach any terminal state.
    OnResolved,
}

impl Default for DependencyRelation {
    fn default() -> Self {
        Self::AllCompleted
    }
}

impl DependencyRelation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllCompleted => "all-completed",
            Self::OnResolved => "on-resolved",
        }
    }

    /// Whether a dependency in `state` already satisfies this relation.
    pub fn satisfied_by(&self, state: TaskState) -> bool {
        match self {
            Self::AllCompleted => state == TaskState::Completed,
            Self::OnResolved => state.is_terminal(),
        }
    }
}

/// Terminal outcome reported when a task resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Completed,
    Failed,
    Exception,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Exception => "exception",
        }
    }

    /// Whether this outcome satisfies a dependent declared with `relation`.
    ///
    /// A failure or exception never satisfies an `all-completed` dependent.
    pub fn satisfies(&self, relation: DependencyRelation) -> bool {
        match relation {
            DependencyRelation::AllCompleted => matches!(self, Self::Completed),
            DependencyRelation::OnResolved => true,
        }
    }
}

/// Lifecycle state of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
    Exception,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Exception => "exception",
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Exception)
    }
}

/// State of a task, derived from its run history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// No runs exist yet.
    Unscheduled,
    Pending,
    Running,
    Completed,
    Failed,
    Exception,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unscheduled => "unscheduled",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Exception => "exception",
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Exception)
    }
}

impl From<RunState> for TaskState {
    fn from(state: RunState) -> Self {
        match state {
            RunState::Pending => Self::Pending,
            RunState::Running => Self::Running,
            RunState::Completed => Self::Completed,
            RunState::Failed => Self::Failed,
            RunState::Exception => Self::Exception,
        }
    }
}

/// Why a run was appended to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReasonCreated {
    /// The run was created because the task became schedulable. The only
    /// reason this crate ever writes; workers append later runs with their
    /// own reasons.
    Scheduled,
}

/// One execution attempt of a task. Run 0 is the initial run appended by
/// the dependency tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Lifecycle state
    pub state: RunState,
    /// Why the run exists
    pub reason_created: ReasonCreated,
    /// When the run was scheduled
    pub scheduled: DateTime<Utc>,
}

impl Run {
    /// The initial pending run for a freshly schedulable task.
    pub fn pending(scheduled: DateTime<Utc>) -> Self {
        Self {
            state: RunState::Pending,
            reason_created: ReasonCreated::Scheduled,
            scheduled,
        }
    }
}

/// Derived, read-only view of a task carried in event payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Task identifier
    pub task_id: Uuid,
    /// Derived state (see [`Task::state`])
    pub state: TaskState,
    /// Run history at snapshot time
    pub runs: Vec<Run>,
    /// Scheduling cutoff
    pub deadline: DateTime<Utc>,
    /// Record expiry
    pub expires: DateTime<Utc>,
}

/// A unit of work with declared prerequisites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: Uuid,
    /// Task IDs this task requires before it may run
    pub dependencies: Vec<Uuid>,
    /// What counts as "satisfied" for each dependency
    pub dependency_relation: DependencyRelation,
    /// After this instant the task is never scheduled
    pub deadline: DateTime<Utc>,
    /// When the task record itself expires. Invariant: every dependency's
    /// `expires` must be at or after this task's `deadline`, else the task
    /// is unschedulable by construction.
    pub expires: DateTime<Utc>,
    /// Append-only run history; `runs[0]` is created by the tracker
    pub runs: Vec<Run>,
    /// Opaque routing keys forwarded to the event publisher
    pub routes: Vec<String>,
    /// Version for optimistic locking
    pub version: u64,
}

impl Task {
    /// Create a task with no dependencies.
    pub fn new(deadline: DateTime<Utc>, expires: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            dependencies: Vec::new(),
            dependency_relation: DependencyRelation::default(),
            deadline,
            expires,
            runs: Vec::new(),
            routes: Vec::new(),
            version: 1,
        }
    }

    /// Add a dependency. Self-edges and duplicates are ignored.
    pub fn with_dependency(mut self, task_id: Uuid) -> Self {
        if !self.dependencies.contains(&task_id) && task_id != self.id {
            self.dependencies.push(task_id);
        }
        self
    }

    /// Set the dependency relation.
    pub fn with_relation(mut self, relation: DependencyRelation) -> Self {
        self.dependency_relation = relation;
        self
    }

    /// Set the scheduling deadline.
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the record expiry.
    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = expires;
        self
    }

    /// Add a routing key for event delivery.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.routes.push(route.into());
        self
    }

    /// Derived state: `unscheduled` when no runs exist, else the state of
    /// the latest run.
    pub fn state(&self) -> TaskState {
        self.runs
            .last()
            .map_or(TaskState::Unscheduled, |run| run.state.into())
    }

    /// Status snapshot for event payloads.
    pub fn status(&self) -> TaskStatus {
        TaskStatus {
            task_id: self.id,
            state: self.state(),
            runs: self.runs.clone(),
            deadline: self.deadline,
            expires: self.expires,
        }
    }
}
