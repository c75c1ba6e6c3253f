//! Polling worker: fetch one task, evaluate it, report the result
//!
//! A worker never holds more than one task. Fetch failures and an empty queue
//! are both answered with a fixed pause before the next poll. A result whose
//! delivery fails transiently is resent after the same pause until it lands;
//! the orchestrator ignores duplicates. Every pause ends early when shutdown
//! is signalled. A task already taken is always evaluated before the worker
//! exits.

use crate::calculation::Evaluator;
use crate::config::AgentSection;
use crate::error::AgentError;
use crate::observability::metrics::metrics;
use crate::protocol::{Task, TaskResult};
use crate::task_span;
use crate::transport::OrchestratorClient;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn, Instrument};

/// Timing knobs for a worker loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Pause after a failed fetch, an empty queue or a failed report
    pub poll_interval: Duration,
    /// Pause after a successful evaluation, before reporting
    pub compute_delay: Duration,
}

impl WorkerSettings {
    pub fn from_config(config: &AgentSection) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            compute_delay: config.compute_delay(),
        }
    }
}

/// What one iteration of the loop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Queue was empty
    Idle,
    /// Orchestrator unreachable or answered with an unexpected status
    FetchFailed,
    /// Task evaluated and a success result produced
    Completed,
    /// Task could not be evaluated and a failure result produced
    Failed,
}

impl PollOutcome {
    /// Whether the loop should back off before polling again
    pub fn should_pause(self) -> bool {
        matches!(self, PollOutcome::Idle | PollOutcome::FetchFailed)
    }
}

pub struct Worker<C: OrchestratorClient + 'static> {
    id: usize,
    client: Arc<C>,
    evaluator: Arc<Evaluator>,
    settings: WorkerSettings,
}

impl<C: OrchestratorClient + 'static> Worker<C> {
    pub fn new(
        id: usize,
        client: Arc<C>,
        evaluator: Arc<Evaluator>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            id,
            client,
            evaluator,
            settings,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Poll until `shutdown` turns true or its sender is dropped
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(worker = self.id, "Worker started");

        while !*shutdown.borrow() {
            let outcome = self.poll_once(&mut shutdown).await;
            if outcome.should_pause() && pause(self.settings.poll_interval, &mut shutdown).await {
                break;
            }
        }

        info!(worker = self.id, "Worker stopped");
    }

    /// One fetch, and if a task arrived, one evaluation and report
    pub async fn poll_once(&self, shutdown: &mut watch::Receiver<bool>) -> PollOutcome {
        let task = match self.client.fetch_task().await {
            Ok(Some(task)) => task,
            Ok(None) => {
                metrics().idle_poll();
                debug!(worker = self.id, "No task available");
                return PollOutcome::Idle;
            }
            Err(e) => {
                metrics().fetch_failed();
                warn!(worker = self.id, error = %e, "Failed to fetch task");
                return PollOutcome::FetchFailed;
            }
        };

        let span = task_span!(expression_id = %task.id, worker = self.id);
        async move {
            let result = self.process(&task).await;
            let outcome = if result.is_failure() {
                PollOutcome::Failed
            } else {
                PollOutcome::Completed
            };

            self.report(&result, shutdown).await;
            outcome
        }
        .instrument(span)
        .await
    }

    /// Send `result`, resending after `poll_interval` while failures are transient.
    ///
    /// Gives up on a permanent failure or when shutdown is signalled.
    async fn report(&self, result: &TaskResult, shutdown: &mut watch::Receiver<bool>) {
        let mut attempt: u32 = 1;
        loop {
            let err = match self.client.send_result(result).await {
                Ok(()) => {
                    if attempt > 1 {
                        info!(attempts = attempt, "Result reported after retry");
                    }
                    return;
                }
                Err(e) => e,
            };

            metrics().report_failed();
            if !err.is_transient() {
                warn!(error = %err, "Dropping result after permanent report failure");
                return;
            }
            warn!(error = %err, attempt, "Failed to report result, will retry");
            if pause(self.settings.poll_interval, shutdown).await {
                warn!(attempts = attempt, "Shutdown before result was delivered");
                return;
            }
            attempt += 1;
        }
    }

    /// Evaluate a task into the result to report
    pub async fn process(&self, task: &Task) -> TaskResult {
        if !task.is_well_formed() {
            let err = AgentError::MalformedTask {
                id: task.id,
                numbers: task.numbers.len(),
                operators: task.operators.len(),
            };
            warn!(error = %err, "Rejecting task");
            return TaskResult::failure(task.id, err.to_string());
        }

        let infix = task.to_infix();
        let started = Instant::now();
        match self.evaluator.evaluate(&infix).await {
            Ok(value) => {
                metrics().task_evaluated(started.elapsed(), true);
                info!(expression = %infix, result = value, "Task evaluated");
                if !self.settings.compute_delay.is_zero() {
                    tokio::time::sleep(self.settings.compute_delay).await;
                }
                TaskResult::success(task.id, value)
            }
            Err(e) => {
                metrics().task_evaluated(started.elapsed(), false);
                let err = AgentError::from(e);
                warn!(expression = %infix, error = %err, "Task evaluation failed");
                TaskResult::failure(task.id, err.to_string())
            }
        }
    }
}

/// Sleep for `duration` unless shutdown arrives first. Returns true on shutdown.
async fn pause(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => *shutdown.borrow(),
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}
