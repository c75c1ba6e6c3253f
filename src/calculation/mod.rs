//! Arithmetic core: submission tokenizer and shunting-yard evaluator

pub mod errors;
pub mod evaluator;
pub mod operator;
pub mod tokenizer;

pub use errors::{EvalError, FormationError};
pub use evaluator::{Evaluator, OperationTimings};
pub use operator::Operator;
pub use tokenizer::{tokenize, TokenStream};
