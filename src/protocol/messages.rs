//! Wire message types for the calculator protocol
//!
//! Defines the JSON shapes exchanged between clients, the orchestrator and
//! computing agents: submissions, tasks, results and expression snapshots.

use crate::calculation::tokenizer::render_infix;
use crate::calculation::{Operator, TokenStream};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Body of `POST /api/v1/calculate`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalculateRequest {
    pub expression: String,
}

/// Reply to a successful submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalculateResponse {
    pub id: Uuid,
}

/// Unit of work handed to an agent.
///
/// The identifier is shared with the owning [`Expression`].
///
/// # Examples
/// ```
/// use distcalc::calculation::Operator;
/// use distcalc::protocol::Task;
/// use uuid::Uuid;
///
/// let task = Task {
///     id: Uuid::new_v4(),
///     numbers: vec![2.0, 3.0, 4.0],
///     operators: vec![Operator::Add, Operator::Multiply],
/// };
/// assert_eq!(task.to_infix(), "2+3*4");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub numbers: Vec<f64>,
    pub operators: Vec<Operator>,
}

impl Task {
    pub fn from_tokens(id: Uuid, tokens: TokenStream) -> Self {
        Self {
            id,
            numbers: tokens.numbers,
            operators: tokens.operators,
        }
    }

    /// Operand count is operator count plus one
    pub fn is_well_formed(&self) -> bool {
        self.numbers.len() == self.operators.len() + 1
    }

    /// Compact infix form understood by the evaluator
    pub fn to_infix(&self) -> String {
        render_infix(&self.numbers, &self.operators)
    }
}

/// Outcome reported by an agent for a [`Task`].
///
/// `error` is set when evaluation failed; `result` is then meaningless.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskResult {
    pub id: Uuid,
    #[serde(default)]
    pub result: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    pub fn success(id: Uuid, result: f64) -> Self {
        Self {
            id,
            result,
            error: None,
        }
    }

    pub fn failure<S: Into<String>>(id: Uuid, error: S) -> Self {
        Self {
            id,
            result: 0.0,
            error: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Lifecycle status of a submitted expression
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ExpressionStatus {
    /// Completed and failed expressions never change again
    pub fn is_terminal(self) -> bool {
        matches!(self, ExpressionStatus::Completed | ExpressionStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExpressionStatus::Pending => "pending",
            ExpressionStatus::Processing => "processing",
            ExpressionStatus::Completed => "completed",
            ExpressionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ExpressionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a submitted expression and its lifecycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expression {
    pub id: Uuid,
    pub expression: String,
    pub status: ExpressionStatus,
    /// Only present once completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    /// Only present once failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expression {
    pub fn new(id: Uuid, expression: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            expression,
            status: ExpressionStatus::Pending,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of `GET /api/v1/expressions`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpressionList {
    pub expressions: Vec<Expression>,
}

/// Error body returned by every failing route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub timestamp: u64,
}
