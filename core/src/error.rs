//! Error type shared by the registry, derivation engine and evaluator.

use crate::expr::{EvalError, ParseError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MinMaxError {
    #[error("Name '{0}' is already declared")]
    DuplicateName(String),

    #[error("Invalid symbol name: '{0}'")]
    InvalidName(String),

    #[error("Unknown symbol: '{0}'")]
    UnknownSymbol(String),

    #[error("Derivation failed: {0}")]
    Derivation(String),

    #[error("Equation has not been saved")]
    IncompleteEquations,

    #[error("Dimensions of specified values do not match: {lengths:?}")]
    DimensionMismatch { lengths: Vec<usize> },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Evaluation failed in row {row}: {source}")]
    Evaluation { row: usize, source: EvalError },
}

/// Result type for workspace operations.
pub type MinMaxResult<T> = Result<T, MinMaxError>;
