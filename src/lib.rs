//! distcalc - distributed arithmetic calculator
//!
//! Clients submit arithmetic expressions to an orchestrator, which validates
//! them, records them in an in-memory registry and places a task on a bounded
//! queue. Computing agents poll for tasks, evaluate them with a
//! shunting-yard evaluator that simulates per-operator latency, and report
//! the result back.
//!
//! # Overview
//!
//! - [`calculation`]: tokenizer, operators and the evaluator
//! - [`protocol`]: wire types and route paths
//! - [`orchestrator`]: registry, task queue and the dispatch protocol
//! - [`agent`]: worker loops and their lifecycle
//! - [`transport`]: the warp server and the reqwest client
//! - [`observability`]: logging, metrics and health probes
//!
//! # Quick Start
//!
//! ```rust
//! use distcalc::orchestrator::Orchestrator;
//! use distcalc::protocol::{ExpressionStatus, TaskResult};
//!
//! let orchestrator = Orchestrator::new(100);
//! let id = orchestrator.submit("2 + 3 * 4").unwrap();
//!
//! let task = orchestrator.fetch_task().unwrap();
//! assert_eq!(task.id, id);
//!
//! orchestrator.report_result(TaskResult::success(task.id, 14.0));
//! let expression = orchestrator.get_expression(&id).unwrap();
//! assert_eq!(expression.status, ExpressionStatus::Completed);
//! assert_eq!(expression.result, Some(14.0));
//! ```

pub mod agent;
pub mod calculation;
pub mod config;
pub mod error;
pub mod observability;
pub mod orchestrator;
pub mod protocol;
pub mod testing;
pub mod transport;

pub use agent::AgentLifecycle;
pub use calculation::{EvalError, Evaluator, FormationError, OperationTimings, Operator};
pub use config::*;
pub use error::{AgentError, AgentResult, OrchestratorError, OrchestratorResult};
pub use orchestrator::Orchestrator;
pub use protocol::*;
