//! Error types for the orchestrator service and computing agents
//!
//! Maps service errors to HTTP status codes and stable error codes so the
//! transport layer can render them without inspecting variants itself.

use crate::calculation::{EvalError, FormationError};
use crate::protocol::ErrorResponse;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;
use warp::http::StatusCode;

/// Errors surfaced synchronously by the orchestrator
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Task queue is saturated (capacity {capacity})")]
    QueueSaturated { capacity: usize },

    #[error("Malformed expression: {0}")]
    MalformedExpression(#[from] FormationError),

    #[error("Expression not found: {id}")]
    NotFound { id: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl OrchestratorError {
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            OrchestratorError::QueueSaturated { .. } => StatusCode::SERVICE_UNAVAILABLE,
            OrchestratorError::MalformedExpression(_) => StatusCode::BAD_REQUEST,
            OrchestratorError::NotFound { .. } => StatusCode::NOT_FOUND,
            OrchestratorError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            OrchestratorError::QueueSaturated { .. } => "queue_saturated",
            OrchestratorError::MalformedExpression(_) => "malformed_expression",
            OrchestratorError::NotFound { .. } => "not_found",
            OrchestratorError::Internal { .. } => "internal_error",
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
            timestamp: current_timestamp(),
        }
    }
}

/// Errors raised inside a computing agent
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Orchestrator returned status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("Malformed task {id}: {numbers} operands for {operators} operators")]
    MalformedTask {
        id: Uuid,
        numbers: usize,
        operators: usize,
    },

    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] EvalError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AgentError {
    pub fn unexpected_status(status: u16) -> Self {
        Self::UnexpectedStatus { status }
    }

    /// Transport failures are worth retrying; evaluation failures are not
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AgentError::Http(_) | AgentError::UnexpectedStatus { .. }
        )
    }
}

/// Result type for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Result type for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
