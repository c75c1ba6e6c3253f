//! Computing agent: worker loops that pull tasks from the orchestrator,
//! evaluate them and report the outcome.

pub mod lifecycle;
pub mod worker;

pub use lifecycle::AgentLifecycle;
pub use worker::{PollOutcome, Worker, WorkerSettings};
