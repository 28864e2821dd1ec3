//! Domain models for the dependency tracker.

pub mod config;
pub mod edge;
pub mod task;

pub use config::{Config, LoggingConfig, TrackerConfig};
pub use edge::{EdgePage, RequirementEdge, ReverseEdge};
pub use task::{
    DependencyRelation, ReasonCreated, Resolution, Run, RunState, Task, TaskState, TaskStatus,
};
