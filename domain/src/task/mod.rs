//! Tasks, thoughts and their in-round projections.

pub mod context;
pub mod entities;
pub mod priority;
pub mod queue_item;

pub use context::ThoughtContext;
pub use entities::{
    BootstrapStepRef, Task, TaskOrigin, TaskStatus, Thought, ThoughtKind, ThoughtStatus,
};
pub use priority::Priority;
pub use queue_item::{QueueClass, QueueItem};
