//! In-memory adapters for every port.
//!
//! Used by the test suite and by embedders that want a single-process
//! queue without external stores.

pub mod edge_store;
pub mod gateways;
pub mod task_store;

pub use edge_store::{MemoryRequirementEdges, MemoryReverseEdges};
pub use gateways::{MemoryEventPublisher, MemoryPendingQueue, PendingMessage, PublishedEvent};
pub use task_store::MemoryTaskStore;
