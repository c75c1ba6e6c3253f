//! Mock implementations for testing
//!
//! `MockOrchestratorClient` serves tasks from a local list and records every
//! reported result. `InProcessClient` drives a real [`Orchestrator`] without
//! HTTP, for end-to-end protocol tests.

use crate::error::{AgentError, AgentResult};
use crate::orchestrator::Orchestrator;
use crate::protocol::{Task, TaskResult};
use crate::transport::OrchestratorClient;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Scripted orchestrator client
#[derive(Debug, Default)]
pub struct MockOrchestratorClient {
    pub tasks: Arc<Mutex<VecDeque<Task>>>,
    pub results: Arc<Mutex<Vec<TaskResult>>>,
    pub fail_fetch: bool,
    pub fail_send: bool,
    /// Sends that fail with a 503 before sends start succeeding
    pub send_failures: Arc<AtomicUsize>,
    pub send_attempts: Arc<AtomicUsize>,
}

impl MockOrchestratorClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fetch_failure() -> Self {
        Self {
            fail_fetch: true,
            ..Default::default()
        }
    }

    pub fn with_send_failure() -> Self {
        Self {
            fail_send: true,
            ..Default::default()
        }
    }

    /// First `failures` sends answer 503, later ones succeed
    pub fn with_send_failures(failures: usize) -> Self {
        Self {
            send_failures: Arc::new(AtomicUsize::new(failures)),
            ..Default::default()
        }
    }

    pub async fn push_task(&self, task: Task) {
        self.tasks.lock().await.push_back(task);
    }

    pub async fn sent_results(&self) -> Vec<TaskResult> {
        self.results.lock().await.clone()
    }

    pub fn send_attempts(&self) -> usize {
        self.send_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrchestratorClient for MockOrchestratorClient {
    async fn fetch_task(&self) -> AgentResult<Option<Task>> {
        if self.fail_fetch {
            return Err(AgentError::unexpected_status(500));
        }
        Ok(self.tasks.lock().await.pop_front())
    }

    async fn send_result(&self, result: &TaskResult) -> AgentResult<()> {
        self.send_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_send {
            return Err(AgentError::unexpected_status(500));
        }
        let scripted_failure = self
            .send_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_failure {
            return Err(AgentError::unexpected_status(503));
        }
        self.results.lock().await.push(result.clone());
        Ok(())
    }
}

/// Client that talks to an orchestrator in the same process
#[derive(Clone)]
pub struct InProcessClient {
    orchestrator: Arc<Orchestrator>,
}

impl InProcessClient {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }
}

#[async_trait]
impl OrchestratorClient for InProcessClient {
    async fn fetch_task(&self) -> AgentResult<Option<Task>> {
        Ok(self.orchestrator.fetch_task())
    }

    async fn send_result(&self, result: &TaskResult) -> AgentResult<()> {
        self.orchestrator.report_result(result.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::Operator;
    use crate::protocol::ExpressionStatus;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_mock_client_serves_tasks_in_order() {
        let client = MockOrchestratorClient::new();
        let first = Task {
            id: Uuid::new_v4(),
            numbers: vec![1.0, 2.0],
            operators: vec![Operator::Add],
        };
        let second = Task {
            id: Uuid::new_v4(),
            ..first.clone()
        };
        client.push_task(first.clone()).await;
        client.push_task(second.clone()).await;

        assert_eq!(client.fetch_task().await.unwrap(), Some(first));
        assert_eq!(client.fetch_task().await.unwrap(), Some(second));
        assert_eq!(client.fetch_task().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mock_client_failures() {
        let client = MockOrchestratorClient::with_fetch_failure();
        assert!(client.fetch_task().await.is_err());

        let client = MockOrchestratorClient::with_send_failure();
        let result = TaskResult::success(Uuid::new_v4(), 1.0);
        assert!(client.send_result(&result).await.is_err());
        assert!(client.sent_results().await.is_empty());
    }

    #[tokio::test]
    async fn test_mock_client_scripted_send_failures() {
        let client = MockOrchestratorClient::with_send_failures(2);
        let result = TaskResult::success(Uuid::new_v4(), 1.0);

        assert!(client.send_result(&result).await.is_err());
        assert!(client.send_result(&result).await.is_err());
        client.send_result(&result).await.unwrap();

        assert_eq!(client.send_attempts(), 3);
        assert_eq!(client.sent_results().await, vec![result]);
    }

    #[tokio::test]
    async fn test_in_process_client_round_trip() {
        let orchestrator = Arc::new(Orchestrator::new(2));
        let client = InProcessClient::new(orchestrator.clone());
        let id = orchestrator.submit("3 * 3").unwrap();

        let task = client.fetch_task().await.unwrap().unwrap();
        client
            .send_result(&TaskResult::success(task.id, 9.0))
            .await
            .unwrap();

        let expr = orchestrator.get_expression(&id).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Completed);
        assert_eq!(expr.result, Some(9.0));
    }
}
