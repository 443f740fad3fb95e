//! Task state management.
//!
//! The locally held view of the tracked task and the pure transition
//! function that folds service snapshots into it.

mod machine;
mod payload;
mod snapshot;
mod task;

pub use machine::{check, reconcile, TransitionError};
pub use payload::{resolve, Payload, ResourceLinks};
pub use snapshot::Snapshot;
pub use task::{Task, TaskId, TaskStatus, STARTING_LOG};
