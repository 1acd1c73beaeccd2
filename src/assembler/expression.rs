//! Operand expressions
//!
//! Expressions are small: numbers, symbol references and `*` combined with
//! `+`/`-`, an optional unary minus per term, and an optional leading `<` or
//! `>` selecting the low or high byte of the whole expression.

use std::fmt;

use super::lexer::{TokenStream, TokenType};
use super::symbol_table::SymbolTable;

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Number(i32),
    Symbol(String),
    /// `*`, the address of the current statement
    CurrentAddress,
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    LowByte(Box<Expr>),
    HighByte(Box<Expr>),
}

/// Evaluation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("undefined symbol '{0}'")]
    Undefined(String),
}

impl Expr {
    /// Evaluates against the symbols known so far.
    ///
    /// ```
    /// use tool6502::assembler::expression::Expr;
    /// use tool6502::assembler::symbol_table::SymbolTable;
    ///
    /// let mut symbols = SymbolTable::new();
    /// symbols.define("base", 0x1234, 1).unwrap();
    ///
    /// let expr = Expr::HighByte(Box::new(Expr::Symbol("base".into())));
    /// assert_eq!(expr.evaluate(&symbols, 0), Ok(0x12));
    /// ```
    pub fn evaluate(&self, symbols: &SymbolTable, current_address: u16) -> Result<i32, EvalError> {
        Ok(match self {
            Expr::Number(n) => *n,
            Expr::Symbol(name) => symbols
                .lookup_symbol(name)
                .map(|s| s.address as i32)
                .ok_or_else(|| EvalError::Undefined(name.clone()))?,
            Expr::CurrentAddress => current_address as i32,
            Expr::Neg(inner) => -inner.evaluate(symbols, current_address)?,
            Expr::Add(l, r) => {
                l.evaluate(symbols, current_address)? + r.evaluate(symbols, current_address)?
            }
            Expr::Sub(l, r) => {
                l.evaluate(symbols, current_address)? - r.evaluate(symbols, current_address)?
            }
            Expr::LowByte(inner) => inner.evaluate(symbols, current_address)? & 0xFF,
            Expr::HighByte(inner) => (inner.evaluate(symbols, current_address)? >> 8) & 0xFF,
        })
    }

    /// True when the expression mentions no symbols.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Number(_) | Expr::CurrentAddress => true,
            Expr::Symbol(_) => false,
            Expr::Neg(e) | Expr::LowByte(e) | Expr::HighByte(e) => e.is_constant(),
            Expr::Add(l, r) | Expr::Sub(l, r) => l.is_constant() && r.is_constant(),
        }
    }

    /// True for a `<expr` or `>expr` byte selection, which always fits in a byte.
    pub fn is_byte_select(&self) -> bool {
        matches!(self, Expr::LowByte(_) | Expr::HighByte(_))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) if *n >= 0 => write!(f, "${:X}", n),
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Symbol(name) => f.write_str(name),
            Expr::CurrentAddress => f.write_str("*"),
            Expr::Neg(e) => write!(f, "-{}", e),
            Expr::Add(l, r) => write!(f, "{}+{}", l, r),
            Expr::Sub(l, r) => write!(f, "{}-{}", l, r),
            Expr::LowByte(e) => write!(f, "<{}", e),
            Expr::HighByte(e) => write!(f, ">{}", e),
        }
    }
}

/// Parses `['<'|'>'] term (('+'|'-') term)*` from the stream.
///
/// Returns an error message naming what was found instead of a term.
pub(crate) fn parse_expression(stream: &mut TokenStream) -> Result<Expr, String> {
    stream.skip_whitespace();
    let selector = match stream.peek_type() {
        TokenType::Less => Some(true),
        TokenType::Greater => Some(false),
        _ => None,
    };
    if selector.is_some() {
        stream.advance();
    }

    let mut expr = parse_term(stream)?;
    loop {
        stream.skip_whitespace();
        let add = match stream.peek_type() {
            TokenType::Plus => true,
            TokenType::Minus => false,
            _ => break,
        };
        stream.advance();
        let rhs = parse_term(stream)?;
        expr = if add {
            Expr::Add(Box::new(expr), Box::new(rhs))
        } else {
            Expr::Sub(Box::new(expr), Box::new(rhs))
        };
    }

    Ok(match selector {
        Some(true) => Expr::LowByte(Box::new(expr)),
        Some(false) => Expr::HighByte(Box::new(expr)),
        None => expr,
    })
}

fn parse_term(stream: &mut TokenStream) -> Result<Expr, String> {
    stream.skip_whitespace();
    let found = stream.peek_type().clone();
    let term = match found {
        TokenType::Minus => {
            stream.advance();
            return Ok(Expr::Neg(Box::new(parse_term(stream)?)));
        }
        TokenType::HexNumber(n) | TokenType::DecimalNumber(n) | TokenType::BinaryNumber(n) => {
            Expr::Number(n as i32)
        }
        TokenType::CharLiteral(c) => Expr::Number(c as i32),
        TokenType::Identifier(name) => Expr::Symbol(name),
        TokenType::Star => Expr::CurrentAddress,
        other => return Err(format!("expected expression, found {}", describe(&other))),
    };
    stream.advance();
    Ok(term)
}

pub(crate) fn describe(token: &TokenType) -> String {
    match token {
        TokenType::Identifier(s) => format!("'{}'", s),
        TokenType::Newline | TokenType::Eof | TokenType::Comment(_) => "end of line".into(),
        TokenType::StringLiteral(_) => "string".into(),
        other => format!("{:?}", other).to_lowercase(),
    }
}
