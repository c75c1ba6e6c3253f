//! In-memory table of submitted expressions
//!
//! Every read and write goes through one coarse mutex. Critical sections are
//! O(1) apart from snapshots and never await.

use crate::protocol::{Expression, ExpressionStatus, TaskResult};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What happened when a result was reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOutcome {
    Completed,
    Failed,
    /// Unknown identifier or already terminal
    Ignored,
}

#[derive(Debug, Default)]
pub struct ExpressionRegistry {
    expressions: Mutex<HashMap<Uuid, Expression>>,
}

impl ExpressionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the table. The guard must not be held across an `.await`.
    pub(crate) fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Expression>> {
        match self.expressions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<Expression> {
        self.lock().get(id).cloned()
    }

    /// Snapshot of every expression, oldest first
    pub fn snapshot(&self) -> Vec<Expression> {
        let mut expressions: Vec<Expression> = self.lock().values().cloned().collect();
        expressions.sort_by_key(|e| e.created_at);
        expressions
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply a reported result. Only `processing` expressions change.
    pub fn apply_result(&self, result: &TaskResult) -> ResultOutcome {
        let mut expressions = self.lock();
        let Some(expr) = expressions.get_mut(&result.id) else {
            debug!(expression_id = %result.id, "Ignoring result for unknown expression");
            return ResultOutcome::Ignored;
        };

        if expr.status != ExpressionStatus::Processing {
            debug!(
                expression_id = %result.id,
                status = %expr.status,
                "Ignoring result for expression that is not processing"
            );
            return ResultOutcome::Ignored;
        }

        expr.updated_at = Utc::now();
        match &result.error {
            None => {
                expr.status = ExpressionStatus::Completed;
                expr.result = Some(result.result);
                info!(expression_id = %result.id, result = result.result, "Expression completed");
                ResultOutcome::Completed
            }
            Some(error) => {
                expr.status = ExpressionStatus::Failed;
                expr.error = Some(error.clone());
                warn!(expression_id = %result.id, error = %error, "Expression failed");
                ResultOutcome::Failed
            }
        }
    }
}

/// Move a pending expression to processing
pub(crate) fn mark_processing(expr: &mut Expression) {
    if expr.status == ExpressionStatus::Pending {
        expr.status = ExpressionStatus::Processing;
        expr.updated_at = Utc::now();
    }
}
