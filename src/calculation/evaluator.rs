//! Shunting-yard evaluator for infix arithmetic
//!
//! Evaluates binary `+ - * /` with parentheses, standard precedence and left
//! associativity using an operand stack and an operator stack. Every operator
//! application waits for a per-operator latency to simulate heterogeneous
//! computation cost; the wait is a `tokio` sleep so other tasks keep running.

use super::errors::EvalError;
use super::operator::Operator;
use std::time::Duration;
use tokio::time::sleep;
use tracing::trace;

/// Simulated cost of applying each operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTimings {
    pub addition: Duration,
    pub subtraction: Duration,
    pub multiplication: Duration,
    pub division: Duration,
}

impl Default for OperationTimings {
    fn default() -> Self {
        Self {
            addition: Duration::from_millis(100),
            subtraction: Duration::from_millis(200),
            multiplication: Duration::from_millis(300),
            division: Duration::from_millis(400),
        }
    }
}

impl OperationTimings {
    /// No artificial latency at all.
    pub fn zero() -> Self {
        Self::uniform(Duration::ZERO)
    }

    /// Same latency for every operator.
    pub fn uniform(latency: Duration) -> Self {
        Self {
            addition: latency,
            subtraction: latency,
            multiplication: latency,
            division: latency,
        }
    }

    pub fn for_operator(&self, op: Operator) -> Duration {
        match op {
            Operator::Add => self.addition,
            Operator::Subtract => self.subtraction,
            Operator::Multiply => self.multiplication,
            Operator::Divide => self.division,
        }
    }
}

/// Two-stack infix evaluator with configurable operator latency.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    timings: OperationTimings,
}

const LEFT_PAREN: char = '(';
const RIGHT_PAREN: char = ')';

impl Evaluator {
    pub fn new(timings: OperationTimings) -> Self {
        Self { timings }
    }

    /// Evaluator without simulated latency.
    pub fn instant() -> Self {
        Self::new(OperationTimings::zero())
    }

    pub fn timings(&self) -> &OperationTimings {
        &self.timings
    }

    /// Evaluate an infix expression. Whitespace is ignored.
    pub async fn evaluate(&self, expression: &str) -> Result<f64, EvalError> {
        let chars: Vec<char> = expression.chars().filter(|c| !c.is_whitespace()).collect();

        check_structure(&chars)?;

        let mut values: Vec<f64> = Vec::new();
        let mut ops: Vec<char> = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if is_numeric(c) {
                let start = i;
                while i < chars.len() && is_numeric(chars[i]) {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| EvalError::InvalidToken(literal.clone()))?;
                values.push(value);
                continue;
            }

            if c == LEFT_PAREN {
                ops.push(c);
            } else if c == RIGHT_PAREN {
                loop {
                    match ops.pop() {
                        Some(LEFT_PAREN) => break,
                        Some(op) => self.apply(op, &mut values).await?,
                        None => return Err(EvalError::UnbalancedParentheses),
                    }
                }
            } else if let Some(incoming) = Operator::from_char(c) {
                while let Some(&top) = ops.last() {
                    let reduces = top != LEFT_PAREN
                        && Operator::from_char(top)
                            .map_or(true, |top| top.precedence() >= incoming.precedence());
                    if !reduces {
                        break;
                    }
                    ops.pop();
                    self.apply(top, &mut values).await?;
                }
                ops.push(c);
            } else {
                return Err(EvalError::InvalidToken(c.to_string()));
            }
            i += 1;
        }

        while let Some(op) = ops.pop() {
            if op == LEFT_PAREN {
                return Err(EvalError::UnbalancedParentheses);
            }
            self.apply(op, &mut values).await?;
        }

        single_value(&values)
    }

    /// Pop two operands, apply `op` after its simulated latency, push the result.
    ///
    /// The second-popped value is the left operand.
    async fn apply(&self, op: char, values: &mut Vec<f64>) -> Result<(), EvalError> {
        if values.len() < 2 {
            return Err(EvalError::InsufficientOperands(op));
        }
        let operator = Operator::from_char(op).ok_or(EvalError::UnsupportedOperator(op))?;

        let latency = self.timings.for_operator(operator);
        if !latency.is_zero() {
            sleep(latency).await;
        }

        let right = values.pop().ok_or(EvalError::InsufficientOperands(op))?;
        let left = values.pop().ok_or(EvalError::InsufficientOperands(op))?;
        let result = compute(operator, left, right)?;
        trace!(%left, %right, operator = %operator, %result, "applied operator");
        values.push(result);
        Ok(())
    }
}

/// Overflow to infinity or NaN is an error; such values cannot travel as JSON.
fn compute(op: Operator, left: f64, right: f64) -> Result<f64, EvalError> {
    let result = match op {
        Operator::Add => left + right,
        Operator::Subtract => left - right,
        Operator::Multiply => left * right,
        Operator::Divide if right == 0.0 => return Err(EvalError::DivisionByZero),
        Operator::Divide => left / right,
    };
    if !result.is_finite() {
        return Err(EvalError::NonFiniteResult(op.symbol()));
    }
    Ok(result)
}

fn single_value(values: &[f64]) -> Result<f64, EvalError> {
    match values {
        [value] => Ok(*value),
        _ => Err(EvalError::ImbalancedResult(values.len())),
    }
}

fn is_numeric(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

fn is_grouping(c: char) -> bool {
    c == LEFT_PAREN || c == RIGHT_PAREN
}

/// Operand count must be operator count plus one, independent of the scan.
fn check_structure(chars: &[char]) -> Result<(), EvalError> {
    let literals = count_fields(chars, |c| Operator::from_char(c).is_some() || is_grouping(c));
    let operators = count_fields(chars, |c| is_numeric(c) || is_grouping(c));
    if literals != operators + 1 {
        return Err(EvalError::InvalidExpression);
    }
    Ok(())
}

/// Number of non-empty runs between separator characters.
fn count_fields(chars: &[char], is_separator: impl Fn(char) -> bool) -> usize {
    chars
        .split(|c| is_separator(*c))
        .filter(|field| !field.is_empty())
        .count()
}
