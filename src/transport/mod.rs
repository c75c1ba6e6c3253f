//! Transport between computing agents and the orchestrator
//!
//! Agents only ever talk to the orchestrator through [`OrchestratorClient`],
//! so worker loops can run against the HTTP client, an in-process client or
//! a mock.

use crate::error::AgentResult;
use crate::protocol::{Task, TaskResult};

pub mod http;

pub use http::{HttpOrchestratorClient, OrchestratorServer};

/// Worker-side view of the dispatch protocol
#[async_trait::async_trait]
pub trait OrchestratorClient: Send + Sync {
    /// Pull at most one task. `Ok(None)` means the queue was empty.
    async fn fetch_task(&self) -> AgentResult<Option<Task>>;

    /// Report the outcome of a task
    async fn send_result(&self, result: &TaskResult) -> AgentResult<()>;
}
