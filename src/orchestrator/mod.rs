//! Orchestrator side of the task distribution protocol
//!
//! Submissions are tokenized, registered and queued; agents pull tasks one at
//! a time and report results, which are reconciled against the registry.

pub mod queue;
pub mod registry;
pub mod service;

pub use queue::{EnqueueError, TaskQueue};
pub use registry::{ExpressionRegistry, ResultOutcome};
pub use service::{Orchestrator, QueueStats};
