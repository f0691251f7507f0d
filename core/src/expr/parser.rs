//! Equation text to [`Expr`].
//!
//! Numbers accept a fraction and exponent (`1.5e-3`). `**` is read as `^`.
//! `pi` and lower-case `e` are the mathematical constants; every other
//! identifier is a symbol unless it is followed by `(`, in which case it
//! must name a built-in function.

use super::types::{BinaryOperator, Expr, Function, MathConstant, UnaryOperator};

/// Parse failure with the byte offset it occurred at
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error at position {}: {}", self.position, self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(f64),
    Ident(String),
    Op(char),
    Open,
    Close,
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    /// Byte offset into the source text
    offset: usize,
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if pred(c)) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Digits with an optional fraction and exponent. An `e` only starts an
    /// exponent when digits follow, so `2*e` keeps Euler's number.
    fn number(&mut self) -> Result<Tok, ParseError> {
        let start = self.pos;
        self.take_while(|c| c.is_ascii_digit() || c == '.');

        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_second(), Some('+' | '-'));
            let digit_at = self.src[self.pos..].chars().nth(if signed { 2 } else { 1 });
            if digit_at.map_or(false, |c| c.is_ascii_digit()) {
                self.bump();
                if signed {
                    self.bump();
                }
                self.take_while(|c| c.is_ascii_digit());
            }
        }

        let text = &self.src[start..self.pos];
        text.parse::<f64>().map(Tok::Num).map_err(|_| ParseError {
            message: format!("Invalid number: '{}'", text),
            position: start,
        })
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            let offset = self.pos;
            let tok = match c {
                c if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                '*' if self.peek_second() == Some('*') => {
                    self.bump();
                    self.bump();
                    Tok::Op('^')
                }
                '+' | '-' | '*' | '/' | '^' => {
                    self.bump();
                    Tok::Op(c)
                }
                '(' => {
                    self.bump();
                    Tok::Open
                }
                ')' => {
                    self.bump();
                    Tok::Close
                }
                c if c.is_ascii_digit() || c == '.' => self.number()?,
                c if c.is_ascii_alphabetic() || c == '_' => Tok::Ident(
                    self.take_while(|c| c.is_ascii_alphanumeric() || c == '_')
                        .to_string(),
                ),
                _ => {
                    return Err(ParseError {
                        message: format!("Unexpected character: '{}'", c),
                        position: offset,
                    })
                }
            };
            tokens.push(Token { tok, offset });
        }

        Ok(tokens)
    }
}

/// Precedence-climbing parser over the token list.
///
/// expression := unary (('+' | '-' | '*' | '/') unary)*   by precedence
/// unary      := ('-' | '+') unary | power
/// power      := primary ('^' unary)?                      right associative
struct Parser<'a> {
    tokens: Vec<Token>,
    cursor: usize,
    end: usize,
    /// Identifiers that stay symbols even when they spell a built-in constant
    shadowed: &'a dyn Fn(&str) -> bool,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.cursor).map(|t| &t.tok)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.cursor).map_or(self.end, |t| t.offset)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            position: self.offset(),
        }
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn infix(&self) -> Option<(BinaryOperator, u8)> {
        match self.peek()? {
            Tok::Op('+') => Some((BinaryOperator::Add, 1)),
            Tok::Op('-') => Some((BinaryOperator::Sub, 1)),
            Tok::Op('*') => Some((BinaryOperator::Mul, 2)),
            Tok::Op('/') => Some((BinaryOperator::Div, 2)),
            _ => None,
        }
    }

    fn expression(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;

        while let Some((op, prec)) = self.infix() {
            if prec < min_prec {
                break;
            }
            self.cursor += 1;
            let right = self.expression(prec + 1)?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&Tok::Op('-')) {
            let operand = self.unary()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Neg,
                operand: Box::new(operand),
            });
        }
        if self.eat(&Tok::Op('+')) {
            return self.unary();
        }

        let base = self.primary()?;
        if self.eat(&Tok::Op('^')) {
            let exponent = self.unary()?;
            return Ok(Expr::binary(BinaryOperator::Pow, base, exponent));
        }
        Ok(base)
    }

    fn close_group(&mut self, what: &str) -> Result<(), ParseError> {
        if self.eat(&Tok::Close) {
            Ok(())
        } else {
            Err(self.error(format!("Expected ')' to close {}", what)))
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let offset = self.offset();
        let Some(tok) = self.peek().cloned() else {
            return Err(self.error("Unexpected end of expression"));
        };
        self.cursor += 1;

        match tok {
            Tok::Num(value) => Ok(Expr::Number(value)),
            Tok::Open => {
                let inner = self.expression(1)?;
                self.close_group("group")?;
                Ok(inner)
            }
            Tok::Ident(name) if self.eat(&Tok::Open) => {
                let func = Function::from_name(&name).ok_or_else(|| ParseError {
                    message: format!("Unknown function: '{}'", name),
                    position: offset,
                })?;
                let arg = self.expression(1)?;
                self.close_group("function argument")?;
                Ok(Expr::call(func, arg))
            }
            Tok::Ident(name) if (self.shadowed)(&name) => Ok(Expr::Symbol(name)),
            Tok::Ident(name) => Ok(match name.as_str() {
                "pi" | "PI" | "Pi" => Expr::Constant(MathConstant::Pi),
                "e" => Expr::Constant(MathConstant::E),
                _ => Expr::Symbol(name),
            }),
            other => Err(ParseError {
                message: format!("Unexpected token: {:?}", other),
                position: offset,
            }),
        }
    }
}

/// Parse equation text into an [`Expr`]
pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
    parse_expression_with(input, &|_| false)
}

/// Like [`parse_expression`], but identifiers for which `shadowed` holds
/// are read as symbols instead of `pi`/`e`
pub fn parse_expression_with(
    input: &str,
    shadowed: &dyn Fn(&str) -> bool,
) -> Result<Expr, ParseError> {
    let tokens = Scanner { src: input, pos: 0 }.tokenize()?;
    if tokens.is_empty() {
        return Err(ParseError {
            message: "Empty expression".to_string(),
            position: 0,
        });
    }

    let mut parser = Parser {
        tokens,
        cursor: 0,
        end: input.len(),
        shadowed,
    };
    let expr = parser.expression(1)?;
    match parser.peek() {
        None => Ok(expr),
        Some(tok) => Err(parser.error(format!("Unexpected token after expression: {:?}", tok))),
    }
}
