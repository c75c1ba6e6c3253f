//! Binary arithmetic operators shared by the tokenizer, the wire format and the evaluator

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four supported binary operators.
///
/// Serializes as its symbol so tasks travel as `["+", "*"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
}

impl Operator {
    pub const ALL: [Operator; 4] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
    ];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            _ => None,
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let mut chars = symbol.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Add | Operator::Subtract => 1,
            Operator::Multiply | Operator::Divide => 2,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_char(op.symbol()), Some(op));
            assert_eq!(Operator::from_symbol(&op.to_string()), Some(op));
        }
    }

    #[test]
    fn test_unknown_symbols_rejected() {
        assert_eq!(Operator::from_char('x'), None);
        assert_eq!(Operator::from_symbol("^"), None);
        assert_eq!(Operator::from_symbol("++"), None);
        assert_eq!(Operator::from_symbol(""), None);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(Operator::Add.precedence(), 1);
        assert_eq!(Operator::Subtract.precedence(), 1);
        assert_eq!(Operator::Multiply.precedence(), 2);
        assert_eq!(Operator::Divide.precedence(), 2);
    }

    #[test]
    fn test_serializes_as_symbol() {
        let json = serde_json::to_string(&vec![Operator::Add, Operator::Divide]).unwrap();
        assert_eq!(json, r#"["+","/"]"#);

        let ops: Vec<Operator> = serde_json::from_str(r#"["-","*"]"#).unwrap();
        assert_eq!(ops, vec![Operator::Subtract, Operator::Multiply]);
    }
}
