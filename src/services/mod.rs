//! Service layer: business-logic coordination over the domain ports.

pub mod dependency_tracker;

pub use dependency_tracker::{DependencyTracker, TaskRef};
