//! Core types for the expression layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Built-in mathematical constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MathConstant {
    Pi,
    E,
}

impl MathConstant {
    pub fn value(&self) -> f64 {
        match self {
            Self::Pi => std::f64::consts::PI,
            Self::E => std::f64::consts::E,
        }
    }
}

impl std::fmt::Display for MathConstant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pi => write!(f, "pi"),
            Self::E => write!(f, "e"),
        }
    }
}

/// Named single-argument functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Abs,
    Ln,
    Log10,
    Exp,
    Floor,
    Ceil,
    Round,
}

impl Function {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Sqrt => "sqrt",
            Self::Abs => "abs",
            Self::Ln => "ln",
            Self::Log10 => "log10",
            Self::Exp => "exp",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sqrt" => Self::Sqrt,
            "abs" => Self::Abs,
            "ln" | "log" => Self::Ln,
            "log10" => Self::Log10,
            "exp" => Self::Exp,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "round" => Self::Round,
            _ => return None,
        };
        Some(func)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Neg,
}

/// Symbolic expression tree.
///
/// Equality and hashing are structural, so two expressions built along
/// different paths compare equal exactly when their trees match. Numbers
/// compare by bit pattern with `-0.0` folded into `0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Free symbol, identified by name
    Symbol(String),
    /// Built-in constant (pi, e)
    Constant(MathConstant),
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation (negation)
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Function call
    FnCall { func: Function, arg: Box<Expr> },
}

fn number_bits(n: f64) -> u64 {
    if n == 0.0 {
        0
    } else {
        n.to_bits()
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => number_bits(*a) == number_bits(*b),
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Constant(a), Self::Constant(b)) => a == b,
            (
                Self::BinaryOp { op: o1, left: l1, right: r1 },
                Self::BinaryOp { op: o2, left: l2, right: r2 },
            ) => o1 == o2 && l1 == l2 && r1 == r2,
            (
                Self::UnaryOp { op: o1, operand: a1 },
                Self::UnaryOp { op: o2, operand: a2 },
            ) => o1 == o2 && a1 == a2,
            (Self::FnCall { func: f1, arg: a1 }, Self::FnCall { func: f2, arg: a2 }) => {
                f1 == f2 && a1 == a2
            }
            _ => false,
        }
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Number(n) => number_bits(*n).hash(state),
            Self::Symbol(name) => name.hash(state),
            Self::Constant(c) => c.hash(state),
            Self::BinaryOp { op, left, right } => {
                op.hash(state);
                left.hash(state);
                right.hash(state);
            }
            Self::UnaryOp { op, operand } => {
                op.hash(state);
                operand.hash(state);
            }
            Self::FnCall { func, arg } => {
                func.hash(state);
                arg.hash(state);
            }
        }
    }
}

impl Expr {
    pub fn number(value: f64) -> Self {
        Self::Number(value)
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    pub fn pi() -> Self {
        Self::Constant(MathConstant::Pi)
    }

    pub fn e() -> Self {
        Self::Constant(MathConstant::E)
    }

    pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Self {
        Self::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(func: Function, arg: Expr) -> Self {
        Self::FnCall {
            func,
            arg: Box::new(arg),
        }
    }

    pub fn pow(self, exponent: impl Into<Expr>) -> Self {
        Self::binary(BinaryOperator::Pow, self, exponent.into())
    }

    pub fn sin(self) -> Self {
        Self::call(Function::Sin, self)
    }

    pub fn cos(self) -> Self {
        Self::call(Function::Cos, self)
    }

    pub fn tan(self) -> Self {
        Self::call(Function::Tan, self)
    }

    pub fn asin(self) -> Self {
        Self::call(Function::Asin, self)
    }

    pub fn acos(self) -> Self {
        Self::call(Function::Acos, self)
    }

    pub fn atan(self) -> Self {
        Self::call(Function::Atan, self)
    }

    pub fn sqrt(self) -> Self {
        Self::call(Function::Sqrt, self)
    }

    pub fn ln(self) -> Self {
        Self::call(Function::Ln, self)
    }

    pub fn exp(self) -> Self {
        Self::call(Function::Exp, self)
    }

    /// Name of the symbol, if this node is a bare symbol
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// Distinct free symbols, sorted by name
    pub fn free_symbols(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Self::Symbol(name) => {
                out.insert(name.as_str());
            }
            Self::Number(_) | Self::Constant(_) => {}
            Self::BinaryOp { left, right, .. } => {
                left.collect_symbols(out);
                right.collect_symbols(out);
            }
            Self::UnaryOp { operand, .. } => operand.collect_symbols(out),
            Self::FnCall { arg, .. } => arg.collect_symbols(out),
        }
    }

    /// True if the named symbol occurs anywhere in the tree
    pub fn has_symbol(&self, name: &str) -> bool {
        match self {
            Self::Symbol(s) => s == name,
            Self::Number(_) | Self::Constant(_) => false,
            Self::BinaryOp { left, right, .. } => left.has_symbol(name) || right.has_symbol(name),
            Self::UnaryOp { operand, .. } => operand.has_symbol(name),
            Self::FnCall { arg, .. } => arg.has_symbol(name),
        }
    }

    /// Structural sub-expression test
    pub fn contains(&self, needle: &Expr) -> bool {
        if self == needle {
            return true;
        }
        match self {
            Self::Number(_) | Self::Symbol(_) | Self::Constant(_) => false,
            Self::BinaryOp { left, right, .. } => left.contains(needle) || right.contains(needle),
            Self::UnaryOp { operand, .. } => operand.contains(needle),
            Self::FnCall { arg, .. } => arg.contains(needle),
        }
    }

    /// Replace every occurrence of the named symbol with `replacement`
    pub fn subs(&self, name: &str, replacement: &Expr) -> Expr {
        self.map_symbols(&mut |s: &str| (s == name).then(|| replacement.clone()))
    }

    /// Rebuild the tree, replacing each symbol for which `f` returns a value.
    /// Replacements are not visited again, so all substitutions are simultaneous.
    pub fn map_symbols<F>(&self, f: &mut F) -> Expr
    where
        F: FnMut(&str) -> Option<Expr>,
    {
        match self {
            Self::Symbol(name) => f(name).unwrap_or_else(|| self.clone()),
            Self::Number(_) | Self::Constant(_) => self.clone(),
            Self::BinaryOp { op, left, right } => {
                Expr::binary(*op, left.map_symbols(f), right.map_symbols(f))
            }
            Self::UnaryOp { op, operand } => Self::UnaryOp {
                op: *op,
                operand: Box::new(operand.map_symbols(f)),
            },
            Self::FnCall { func, arg } => Expr::call(*func, arg.map_symbols(f)),
        }
    }

    /// Binding strength used by the printer
    fn precedence(&self) -> u8 {
        match self {
            Self::BinaryOp { op, .. } => match op {
                BinaryOperator::Add | BinaryOperator::Sub => 1,
                BinaryOperator::Mul | BinaryOperator::Div => 2,
                BinaryOperator::Pow => 4,
            },
            Self::UnaryOp { .. } => 3,
            Self::Number(n) if n.is_sign_negative() && *n != 0.0 => 3,
            _ => 5,
        }
    }

    fn fmt_operand(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        min_precedence: u8,
    ) -> std::fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

fn fmt_number(n: f64, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => fmt_number(*n, f),
            Self::Symbol(name) => write!(f, "{}", name),
            Self::Constant(c) => write!(f, "{}", c),
            Self::BinaryOp { op, left, right } => {
                let p = self.precedence();
                let (symbol, left_min, right_min) = match op {
                    BinaryOperator::Add => (" + ", p, p + 1),
                    BinaryOperator::Sub => (" - ", p, p + 1),
                    BinaryOperator::Mul => ("*", p, p + 1),
                    BinaryOperator::Div => ("/", p, p + 1),
                    // right associative, and the exponent may carry a leading minus
                    BinaryOperator::Pow => ("^", p + 1, 3),
                };
                left.fmt_operand(f, left_min)?;
                write!(f, "{}", symbol)?;
                right.fmt_operand(f, right_min)
            }
            Self::UnaryOp { op, operand } => match op {
                UnaryOperator::Neg => {
                    write!(f, "-")?;
                    // "-a*b" parses as (-a)*b
                    operand.fmt_operand(f, 4)
                }
            },
            Self::FnCall { func, arg } => write!(f, "{}({})", func.name(), arg),
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

macro_rules! impl_binary_ops {
    ($($trait:ident, $method:ident, $op:expr;)*) => {
        $(
            impl<T: Into<Expr>> $trait<T> for Expr {
                type Output = Expr;

                fn $method(self, rhs: T) -> Expr {
                    Expr::binary($op, self, rhs.into())
                }
            }

            impl $trait<Expr> for f64 {
                type Output = Expr;

                fn $method(self, rhs: Expr) -> Expr {
                    Expr::binary($op, Expr::Number(self), rhs)
                }
            }
        )*
    };
}

impl_binary_ops! {
    Add, add, BinaryOperator::Add;
    Sub, sub, BinaryOperator::Sub;
    Mul, mul, BinaryOperator::Mul;
    Div, div, BinaryOperator::Div;
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::UnaryOp {
            op: UnaryOperator::Neg,
            operand: Box::new(self),
        }
    }
}
