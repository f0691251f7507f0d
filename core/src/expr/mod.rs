//! Symbolic expression layer.
//!
//! Provides the algebra the derivation engine works on:
//! - Expression trees built from text or with Rust operators
//! - Substitution, free-symbol introspection and structural containment
//! - Structural equality and hashing for deduplication
//! - Numeric evaluation under symbol bindings
//! - A light structural simplifier and an infix pretty-printer

pub mod types;
pub mod parser;
pub mod evaluator;
pub mod simplify;


pub use types::{BinaryOperator, Expr, Function, MathConstant, UnaryOperator};
pub use parser::{parse_expression, parse_expression_with, ParseError};
pub use evaluator::{evaluate, Bindings, EvalContext, EvalError};
pub use simplify::simplify;
