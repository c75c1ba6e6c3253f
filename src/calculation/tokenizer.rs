//! Submission grammar: space-separated `number op number op number ...`
//!
//! The submission path is stricter than the evaluator. Tokens must alternate
//! number/operator and be separated by whitespace; parentheses are not part of
//! this grammar. The resulting [`TokenStream`] is later re-serialized into a
//! compact infix string for the evaluator.

use super::errors::FormationError;
use super::operator::Operator;

/// Parallel operand/operator sequences extracted from an expression.
///
/// Invariant: `numbers.len() == operators.len() + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenStream {
    pub numbers: Vec<f64>,
    pub operators: Vec<Operator>,
}

/// Split submission text into operands and operators.
pub fn tokenize(text: &str) -> Result<TokenStream, FormationError> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() < 3 || parts.len() % 2 == 0 {
        return Err(FormationError::Arity {
            tokens: parts.len(),
        });
    }

    let mut numbers = Vec::with_capacity(parts.len() / 2 + 1);
    let mut operators = Vec::with_capacity(parts.len() / 2);

    for (i, part) in parts.iter().enumerate() {
        if i % 2 == 0 {
            numbers.push(parse_operand(part)?);
        } else {
            let op = Operator::from_symbol(part)
                .ok_or_else(|| FormationError::UnsupportedOperator(part.to_string()))?;
            operators.push(op);
        }
    }

    Ok(TokenStream { numbers, operators })
}

fn parse_operand(part: &str) -> Result<f64, FormationError> {
    match part.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(FormationError::InvalidNumber(part.to_string())),
    }
}

impl TokenStream {
    /// Render as a compact infix string the evaluator accepts.
    ///
    /// Negative operands become `(0-x)` since the evaluator only knows binary
    /// operators.
    pub fn to_infix(&self) -> String {
        render_infix(&self.numbers, &self.operators)
    }
}

pub(crate) fn render_infix(numbers: &[f64], operators: &[Operator]) -> String {
    let mut out = String::new();
    for (i, number) in numbers.iter().enumerate() {
        if number.is_sign_negative() && *number != 0.0 {
            out.push_str(&format!("(0-{})", -number));
        } else {
            // -0.0 prints as "-0"
            out.push_str(&format!("{}", number.abs()));
        }
        if let Some(op) = operators.get(i) {
            out.push(op.symbol());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple() {
        let stream = tokenize("1 + 2 * 3").unwrap();
        assert_eq!(stream.numbers, vec![1.0, 2.0, 3.0]);
        assert_eq!(stream.operators, vec![Operator::Add, Operator::Multiply]);
    }

    #[test]
    fn test_tokenize_tolerates_extra_whitespace() {
        let stream = tokenize("  4.5\t/  1.5 ").unwrap();
        assert_eq!(stream.numbers, vec![4.5, 1.5]);
        assert_eq!(stream.operators, vec![Operator::Divide]);
    }

    #[test]
    fn test_tokenize_arity_errors() {
        assert_eq!(tokenize(""), Err(FormationError::Arity { tokens: 0 }));
        assert_eq!(tokenize("1"), Err(FormationError::Arity { tokens: 1 }));
        assert_eq!(tokenize("1 +"), Err(FormationError::Arity { tokens: 2 }));
        assert_eq!(tokenize("1 + 2 +"), Err(FormationError::Arity { tokens: 4 }));
    }

    #[test]
    fn test_tokenize_unsupported_operator() {
        assert_eq!(
            tokenize("2 ^ 3"),
            Err(FormationError::UnsupportedOperator("^".to_string()))
        );
        // An operand in operator position is reported as an operator defect
        assert_eq!(
            tokenize("2 3 4"),
            Err(FormationError::UnsupportedOperator("3".to_string()))
        );
    }

    #[test]
    fn test_tokenize_invalid_numbers() {
        assert_eq!(
            tokenize("abc + 1"),
            Err(FormationError::InvalidNumber("abc".to_string()))
        );
        assert_eq!(
            tokenize("1 + inf"),
            Err(FormationError::InvalidNumber("inf".to_string()))
        );
        assert_eq!(
            tokenize("NaN * 2"),
            Err(FormationError::InvalidNumber("NaN".to_string()))
        );
    }

    #[test]
    fn test_tokenize_unparenthesized_grammar_only() {
        assert!(tokenize("(1 + 2) * 3").is_err());
    }

    #[test]
    fn test_to_infix() {
        let stream = tokenize("1 + 2.5 * 3").unwrap();
        assert_eq!(stream.to_infix(), "1+2.5*3");
    }

    #[test]
    fn test_to_infix_wraps_negative_operands() {
        let stream = tokenize("-3 * -2").unwrap();
        assert_eq!(stream.to_infix(), "(0-3)*(0-2)");
    }

    #[test]
    fn test_to_infix_never_uses_exponent_notation() {
        let stream = tokenize("1e3 + 0.5").unwrap();
        assert_eq!(stream.to_infix(), "1000+0.5");
    }

    #[test]
    fn test_to_infix_negative_zero() {
        let stream = tokenize("-0 + 1").unwrap();
        assert_eq!(stream.to_infix(), "0+1");
    }
}
