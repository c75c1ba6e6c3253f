//! Computing agent lifecycle
//!
//! Starts a fixed number of workers sharing one orchestrator client and one
//! evaluator, and stops them together.

use crate::agent::worker::{Worker, WorkerSettings};
use crate::calculation::Evaluator;
use crate::config::AppConfig;
use crate::error::AgentResult;
use crate::transport::{HttpOrchestratorClient, OrchestratorClient};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub struct AgentLifecycle {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl AgentLifecycle {
    /// Spawn `workers` polling loops (at least one)
    pub fn start<C: OrchestratorClient + 'static>(
        client: Arc<C>,
        evaluator: Arc<Evaluator>,
        settings: WorkerSettings,
        workers: usize,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let workers = workers.max(1);

        let handles = (0..workers)
            .map(|id| {
                let worker = Worker::new(id, client.clone(), evaluator.clone(), settings);
                tokio::spawn(worker.run(shutdown_rx.clone()))
            })
            .collect();

        info!(
            workers,
            poll_interval_ms = settings.poll_interval.as_millis() as u64,
            compute_delay_ms = settings.compute_delay.as_millis() as u64,
            "Agent started"
        );

        Self {
            shutdown_tx,
            handles,
        }
    }

    /// Start an HTTP-backed agent from configuration
    pub fn from_config(config: &AppConfig) -> AgentResult<Self> {
        let client = HttpOrchestratorClient::from_config(&config.agent)?;
        info!(orchestrator = %config.agent.orchestrator_url, "Connecting to orchestrator");

        Ok(Self::start(
            Arc::new(client),
            Arc::new(Evaluator::new(config.operations.timings())),
            WorkerSettings::from_config(&config.agent),
            config.agent.workers,
        ))
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// True once every worker loop has returned
    pub fn is_finished(&self) -> bool {
        self.handles.iter().all(JoinHandle::is_finished)
    }

    /// Signal every worker and wait for in-flight tasks to be reported
    pub async fn shutdown(self) {
        info!("Shutting down agent");
        // Receivers outlive the send only while workers run
        let _ = self.shutdown_tx.send(true);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker terminated abnormally");
            }
        }

        info!("Agent shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::Operator;
    use crate::protocol::Task;
    use crate::testing::MockOrchestratorClient;
    use std::time::Duration;
    use uuid::Uuid;

    fn settings() -> WorkerSettings {
        WorkerSettings {
            poll_interval: Duration::from_millis(5),
            compute_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_zero_workers_is_clamped() {
        let agent = AgentLifecycle::start(
            Arc::new(MockOrchestratorClient::new()),
            Arc::new(Evaluator::instant()),
            settings(),
            0,
        );
        assert_eq!(agent.worker_count(), 1);
        agent.shutdown().await;
    }

    #[tokio::test]
    async fn test_workers_drain_queue_then_stop() {
        let client = Arc::new(MockOrchestratorClient::new());
        for i in 0..10 {
            client
                .push_task(Task {
                    id: Uuid::new_v4(),
                    numbers: vec![i as f64, 1.0],
                    operators: vec![Operator::Add],
                })
                .await;
        }

        let agent = AgentLifecycle::start(
            client.clone(),
            Arc::new(Evaluator::instant()),
            settings(),
            3,
        );

        for _ in 0..100 {
            if client.sent_results().await.len() == 10 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        agent.shutdown().await;

        let results = client.sent_results().await;
        assert_eq!(results.len(), 10);
        assert!(results.iter().all(|r| !r.is_failure()));
    }

    #[tokio::test]
    async fn test_from_config_rejects_bad_url() {
        let mut config = AppConfig::test_config();
        config.agent.orchestrator_url = "mailto:nobody".to_string();
        assert!(AgentLifecycle::from_config(&config).is_err());
    }
}
