//! Orchestrator service: submission, dispatch and result reconciliation
//!
//! Owns the expression registry and the task queue. Construct once and share
//! as `Arc<Orchestrator>` with every request handler.

use super::queue::{EnqueueError, TaskQueue};
use super::registry::{mark_processing, ExpressionRegistry, ResultOutcome};
use crate::calculation::tokenize;
use crate::config::OrchestratorSection;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::observability::metrics::metrics;
use crate::protocol::{Expression, Task, TaskResult};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Point-in-time queue occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub queued: usize,
    pub capacity: usize,
}

impl QueueStats {
    pub fn is_saturated(&self) -> bool {
        self.queued >= self.capacity
    }
}

pub struct Orchestrator {
    registry: ExpressionRegistry,
    queue: TaskQueue,
}

impl Orchestrator {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            registry: ExpressionRegistry::new(),
            queue: TaskQueue::new(queue_capacity),
        }
    }

    pub fn from_config(config: &OrchestratorSection) -> Self {
        Self::new(config.queue_capacity)
    }

    /// Validate, register and enqueue an expression.
    ///
    /// On `QueueSaturated` or `MalformedExpression` nothing is registered.
    pub fn submit(&self, text: &str) -> OrchestratorResult<Uuid> {
        let tokens = tokenize(text).map_err(|e| {
            metrics().expression_rejected();
            debug!(error = %e, "Rejected malformed expression");
            OrchestratorError::from(e)
        })?;

        let id = Uuid::new_v4();
        let task = Task::from_tokens(id, tokens);

        let mut expressions = self.registry.lock();
        let expr = expressions
            .entry(id)
            .or_insert_with(|| Expression::new(id, text.to_string()));

        match self.queue.try_enqueue(task) {
            Ok(()) => {
                mark_processing(expr);
                drop(expressions);
                metrics().expression_submitted();
                info!(expression_id = %id, expression = %text, "Expression queued");
                Ok(id)
            }
            Err(EnqueueError::Full(_)) => {
                expressions.remove(&id);
                drop(expressions);
                metrics().queue_saturated();
                warn!(
                    expression_id = %id,
                    capacity = self.queue.capacity(),
                    "Task queue saturated, rejecting expression"
                );
                Err(OrchestratorError::QueueSaturated {
                    capacity: self.queue.capacity(),
                })
            }
            Err(EnqueueError::Closed(_)) => {
                expressions.remove(&id);
                Err(OrchestratorError::internal("task queue is closed"))
            }
        }
    }

    /// Hand out at most one queued task
    pub fn fetch_task(&self) -> Option<Task> {
        let task = self.queue.try_dequeue()?;
        metrics().task_dispatched();
        debug!(expression_id = %task.id, "Task dispatched");
        Some(task)
    }

    /// Reconcile an agent's result. Always acknowledged.
    pub fn report_result(&self, result: TaskResult) -> ResultOutcome {
        let outcome = self.registry.apply_result(&result);
        metrics().result_received(outcome);
        outcome
    }

    pub fn get_expression(&self, id: &Uuid) -> OrchestratorResult<Expression> {
        self.registry
            .get(id)
            .ok_or_else(|| OrchestratorError::not_found(id.to_string()))
    }

    /// Number of registered expressions, without cloning them
    pub fn expression_count(&self) -> usize {
        self.registry.len()
    }

    /// Snapshot of all expressions
    pub fn list_expressions(&self) -> Vec<Expression> {
        self.registry.snapshot()
    }

    pub fn queue_stats(&self) -> QueueStats {
        QueueStats {
            queued: self.queue.len(),
            capacity: self.queue.capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::{FormationError, Operator};
    use crate::protocol::ExpressionStatus;

    #[test]
    fn test_submit_registers_processing_expression() {
        let orchestrator = Orchestrator::new(10);

        let id = orchestrator.submit("2 + 3 * 4").unwrap();

        let expr = orchestrator.get_expression(&id).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Processing);
        assert_eq!(expr.expression, "2 + 3 * 4");
        assert!(expr.result.is_none());
        assert_eq!(orchestrator.queue_stats().queued, 1);
    }

    #[test]
    fn test_submit_malformed_registers_nothing() {
        let orchestrator = Orchestrator::new(10);

        let err = orchestrator.submit("2 +").unwrap_err();

        assert!(matches!(
            err,
            OrchestratorError::MalformedExpression(FormationError::Arity { tokens: 2 })
        ));
        assert!(orchestrator.list_expressions().is_empty());
        assert!(orchestrator.fetch_task().is_none());
    }

    #[test]
    fn test_fetched_task_matches_submission() {
        let orchestrator = Orchestrator::new(10);
        let id = orchestrator.submit("8 - 4 - 2").unwrap();

        let task = orchestrator.fetch_task().unwrap();

        assert_eq!(task.id, id);
        assert_eq!(task.numbers, vec![8.0, 4.0, 2.0]);
        assert_eq!(task.operators, vec![Operator::Subtract, Operator::Subtract]);
        assert!(orchestrator.fetch_task().is_none());
    }

    #[test]
    fn test_saturation() {
        let orchestrator = Orchestrator::new(2);
        orchestrator.submit("1 + 1").unwrap();
        orchestrator.submit("1 + 2").unwrap();

        let err = orchestrator.submit("1 + 3").unwrap_err();

        assert!(matches!(
            err,
            OrchestratorError::QueueSaturated { capacity: 2 }
        ));
        assert_eq!(orchestrator.list_expressions().len(), 2);
        assert_eq!(orchestrator.expression_count(), 2);
        assert!(orchestrator.queue_stats().is_saturated());
    }

    #[test]
    fn test_report_result_round_trip() {
        let orchestrator = Orchestrator::new(10);
        let id = orchestrator.submit("2 + 2").unwrap();
        let task = orchestrator.fetch_task().unwrap();

        let outcome = orchestrator.report_result(TaskResult::success(task.id, 4.0));

        assert_eq!(outcome, ResultOutcome::Completed);
        let expr = orchestrator.get_expression(&id).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Completed);
        assert_eq!(expr.result, Some(4.0));
    }

    #[test]
    fn test_get_unknown_expression() {
        let orchestrator = Orchestrator::new(1);
        let err = orchestrator.get_expression(&Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, OrchestratorError::NotFound { .. }));
    }
}
