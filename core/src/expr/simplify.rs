//! Structural simplification.
//!
//! This is a bottom-up normalizer, not a computer algebra system: it folds
//! numeric sub-expressions and removes trivial identities, but never
//! reorders or distributes terms. Function calls on numeric arguments are
//! kept symbolic (`sqrt(2)` stays `sqrt(2)`).

use super::types::{BinaryOperator, Expr, UnaryOperator};

/// Simplify an expression tree
pub fn simplify(expr: &Expr) -> Expr {
    match expr {
        Expr::Number(_) | Expr::Symbol(_) | Expr::Constant(_) => expr.clone(),
        Expr::BinaryOp { op, left, right } => simplify_binary(*op, simplify(left), simplify(right)),
        Expr::UnaryOp { op, operand } => match op {
            UnaryOperator::Neg => simplify_neg(simplify(operand)),
        },
        Expr::FnCall { func, arg } => Expr::call(*func, simplify(arg)),
    }
}

fn is_number(expr: &Expr, value: f64) -> bool {
    matches!(expr, Expr::Number(n) if *n == value)
}

fn simplify_neg(operand: Expr) -> Expr {
    match operand {
        Expr::Number(n) => Expr::Number(-n),
        Expr::UnaryOp {
            op: UnaryOperator::Neg,
            operand,
        } => *operand,
        other => -other,
    }
}

fn fold(op: BinaryOperator, l: f64, r: f64) -> Option<f64> {
    let value = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Sub => l - r,
        BinaryOperator::Mul => l * r,
        BinaryOperator::Div if r != 0.0 => l / r,
        BinaryOperator::Div => return None,
        BinaryOperator::Pow => l.powf(r),
    };
    value.is_finite().then_some(value)
}

fn simplify_binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    if let (Expr::Number(l), Expr::Number(r)) = (&left, &right) {
        if let Some(value) = fold(op, *l, *r) {
            return Expr::Number(value);
        }
    }

    match op {
        BinaryOperator::Add => {
            if is_number(&left, 0.0) {
                return right;
            }
            if is_number(&right, 0.0) {
                return left;
            }
        }
        BinaryOperator::Sub => {
            if is_number(&right, 0.0) {
                return left;
            }
            if is_number(&left, 0.0) {
                return simplify_neg(right);
            }
            if left == right {
                return Expr::Number(0.0);
            }
        }
        BinaryOperator::Mul => {
            if is_number(&left, 0.0) || is_number(&right, 0.0) {
                return Expr::Number(0.0);
            }
            if is_number(&left, 1.0) {
                return right;
            }
            if is_number(&right, 1.0) {
                return left;
            }
            if is_number(&left, -1.0) {
                return simplify_neg(right);
            }
        }
        BinaryOperator::Div => {
            if is_number(&right, 1.0) {
                return left;
            }
            if left == right && !is_number(&left, 0.0) {
                return Expr::Number(1.0);
            }
        }
        BinaryOperator::Pow => {
            if is_number(&right, 1.0) {
                return left;
            }
            if is_number(&right, 0.0) || is_number(&left, 1.0) {
                return Expr::Number(1.0);
            }
        }
    }

    Expr::binary(op, left, right)
}
