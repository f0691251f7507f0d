//! Numeric evaluation of expressions under a set of symbol bindings.

use super::types::{BinaryOperator, Expr, Function, UnaryOperator};
use std::collections::HashMap;

/// Symbol name to numeric value
pub type Bindings = HashMap<String, f64>;

/// Evaluation error
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Symbol without a bound value
    UnboundSymbol(String),
    /// Division by zero
    DivisionByZero,
    /// Invalid function argument or non-real result (e.g., sqrt of negative)
    InvalidArgument(String),
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnboundSymbol(name) => write!(f, "No value bound for symbol: {}", name),
            Self::DivisionByZero => write!(f, "Division by zero"),
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for EvalError {}

/// Evaluation context
pub struct EvalContext<'a> {
    bindings: &'a Bindings,
}

impl<'a> EvalContext<'a> {
    pub fn new(bindings: &'a Bindings) -> Self {
        Self { bindings }
    }

    /// Reduce an expression to a finite real number
    pub fn eval_expr(&self, expr: &Expr) -> Result<f64, EvalError> {
        match expr {
            Expr::Number(n) => Ok(*n),

            Expr::Symbol(name) => self
                .bindings
                .get(name)
                .copied()
                .ok_or_else(|| EvalError::UnboundSymbol(name.clone())),

            Expr::Constant(c) => Ok(c.value()),

            Expr::BinaryOp { op, left, right } => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;

                let value = match op {
                    BinaryOperator::Add => l + r,
                    BinaryOperator::Sub => l - r,
                    BinaryOperator::Mul => l * r,
                    BinaryOperator::Div if r == 0.0 => return Err(EvalError::DivisionByZero),
                    BinaryOperator::Div => l / r,
                    BinaryOperator::Pow => l.powf(r),
                };
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(EvalError::InvalidArgument(format!(
                        "{:?} of {} and {} has no finite real value",
                        op, l, r
                    )))
                }
            }

            Expr::UnaryOp { op, operand } => {
                let val = self.eval_expr(operand)?;
                match op {
                    UnaryOperator::Neg => Ok(-val),
                }
            }

            Expr::FnCall { func, arg } => {
                let val = self.eval_expr(arg)?;
                apply_function(*func, val)
            }
        }
    }
}

fn apply_function(func: Function, val: f64) -> Result<f64, EvalError> {
    match func {
        Function::Sin => Ok(val.sin()),
        Function::Cos => Ok(val.cos()),
        Function::Tan => Ok(val.tan()),
        Function::Asin => {
            if !(-1.0..=1.0).contains(&val) {
                Err(EvalError::InvalidArgument("asin argument must be in [-1, 1]".to_string()))
            } else {
                Ok(val.asin())
            }
        }
        Function::Acos => {
            if !(-1.0..=1.0).contains(&val) {
                Err(EvalError::InvalidArgument("acos argument must be in [-1, 1]".to_string()))
            } else {
                Ok(val.acos())
            }
        }
        Function::Atan => Ok(val.atan()),
        Function::Sqrt => {
            if val < 0.0 {
                Err(EvalError::InvalidArgument("sqrt of negative number".to_string()))
            } else {
                Ok(val.sqrt())
            }
        }
        Function::Abs => Ok(val.abs()),
        Function::Ln => {
            if val <= 0.0 {
                Err(EvalError::InvalidArgument("ln of non-positive number".to_string()))
            } else {
                Ok(val.ln())
            }
        }
        Function::Log10 => {
            if val <= 0.0 {
                Err(EvalError::InvalidArgument("log10 of non-positive number".to_string()))
            } else {
                Ok(val.log10())
            }
        }
        Function::Exp => {
            let out = val.exp();
            if out.is_finite() {
                Ok(out)
            } else {
                Err(EvalError::InvalidArgument("exp overflow".to_string()))
            }
        }
        Function::Floor => Ok(val.floor()),
        Function::Ceil => Ok(val.ceil()),
        Function::Round => Ok(val.round()),
    }
}

/// Evaluate an expression given symbol bindings
pub fn evaluate(expr: &Expr, bindings: &Bindings) -> Result<f64, EvalError> {
    EvalContext::new(bindings).eval_expr(expr)
}
