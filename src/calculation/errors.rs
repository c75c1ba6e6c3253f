//! Error types for expression formation and evaluation

use thiserror::Error;

/// Defects found while splitting submitted text into operands and operators.
///
/// These are surfaced synchronously to the submitter and never retried.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FormationError {
    #[error("expected an odd number of at least 3 space-separated tokens, got {tokens}")]
    Arity { tokens: usize },

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("invalid number: {0}")]
    InvalidNumber(String),
}

/// Failures raised by the shunting-yard evaluator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    #[error("invalid expression: operand and operator counts do not match")]
    InvalidExpression,

    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("invalid token: {0:?}")]
    InvalidToken(String),

    #[error("insufficient operands for operator {0}")]
    InsufficientOperands(char),

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(char),

    #[error("division by zero")]
    DivisionByZero,

    #[error("expected exactly one value after evaluation, found {0}")]
    ImbalancedResult(usize),

    #[error("result of {0} is not a finite number")]
    NonFiniteResult(char),
}
