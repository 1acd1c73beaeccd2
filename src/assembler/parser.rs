//! Assembly source parser
//!
//! Each source line is tokenized and parsed on its own, so a malformed line
//! produces one error and never disturbs its neighbours.

use super::expression::{describe, parse_expression, Expr};
use super::lexer::{tokenize_from_line, TokenStream, TokenType};
use crate::resolver::{IndexRegister, OperandSyntax};

/// One item of a `DB` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataItem {
    Expr(Expr),
    /// Bytes of a string literal
    Bytes(Vec<u8>),
}

/// The statement part of a line, after any label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Instruction {
        mnemonic: String,
        syntax: OperandSyntax,
        expr: Option<Expr>,
    },
    /// `ORG expr`
    Origin(Expr),
    /// `DB`/`BYTE`
    Bytes(Vec<DataItem>),
    /// `DW`/`WORD`
    Words(Vec<Expr>),
    /// `name = expr` or `name EQU expr`
    Equate { name: String, expr: Expr },
    /// `@name args`
    MacroCall { name: String, args: String },
}

/// A parsed line of assembly source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// Line number in source file (1-indexed)
    pub line_number: usize,

    /// Optional label definition (e.g., "START" from "START:")
    pub label: Option<String>,

    pub statement: Option<Statement>,

    /// Column where the statement starts
    pub column: usize,
}

/// Syntax error on a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Validate a label name according to 6502 conventions
///
/// Labels must:
/// - Start with a letter or underscore
/// - Contain only alphanumeric characters and underscores
/// - Not exceed 32 characters in length
/// - Not be a register name (`A`, `X`, `Y`)
pub fn validate_label(name: &str) -> Result<(), String> {
    let Some(first) = name.chars().next() else {
        return Err("label name cannot be empty".to_string());
    };

    if name.len() > 32 {
        return Err(format!("label name too long (max 32 characters): {}", name));
    }

    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(format!(
            "label must start with a letter or underscore, not '{}'",
            first
        ));
    }

    if let Some(ch) = name.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
        return Err(format!(
            "label contains invalid character '{}' (only letters, digits, and underscores allowed)",
            ch
        ));
    }

    if matches!(name.to_ascii_uppercase().as_str(), "A" | "X" | "Y") {
        return Err(format!("'{}' is a register name", name));
    }

    Ok(())
}

/// Parse every line of `source`; results are in line order.
pub fn parse_source(source: &str, first_line: usize) -> Vec<Result<ParsedLine, ParseError>> {
    source
        .lines()
        .enumerate()
        .map(|(index, text)| parse_line(text, first_line + index))
        .collect()
}

/// Parse one line of source text.
///
/// # Examples
///
/// ```
/// use tool6502::assembler::parser::{parse_line, Statement};
/// use tool6502::resolver::OperandSyntax;
///
/// let line = parse_line("start: LDA #$55 ; load", 2).unwrap();
/// assert_eq!(line.label.as_deref(), Some("start"));
/// assert!(matches!(
///     line.statement,
///     Some(Statement::Instruction { syntax: OperandSyntax::Immediate, .. })
/// ));
/// ```
pub fn parse_line(text: &str, line_number: usize) -> Result<ParsedLine, ParseError> {
    let tokens = tokenize_from_line(text, line_number).map_err(|errors| {
        let first = &errors[0];
        let (line, column) = first.location();
        ParseError {
            line,
            column,
            message: first.to_string(),
        }
    })?;

    LineParser {
        stream: TokenStream::new(tokens),
        line_number,
    }
    .parse()
}

struct LineParser {
    stream: TokenStream,
    line_number: usize,
}

impl LineParser {
    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.line_number,
            column: self.stream.current_location().1,
            message: message.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        self.error(format!(
            "expected {}, found {}",
            expected,
            describe(self.stream.peek_type())
        ))
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        parse_expression(&mut self.stream).map_err(|message| self.error(message))
    }

    fn parse(mut self) -> Result<ParsedLine, ParseError> {
        self.stream.skip_whitespace();
        let mut label = None;

        // label:
        if let TokenType::Identifier(name) = self.stream.peek_type().clone() {
            if matches!(
                self.stream.peek_n(1).map(|t| &t.token_type),
                Some(TokenType::Colon)
            ) {
                validate_label(&name).map_err(|message| self.error(message))?;
                self.stream.advance();
                self.stream.advance();
                label = Some(name);
            }
        }

        self.stream.skip_whitespace();
        let column = self.stream.current_location().1;
        let statement = if self.stream.at_line_end() {
            None
        } else {
            Some(self.statement()?)
        };

        if !self.stream.at_line_end() {
            return Err(self.unexpected("end of line"));
        }

        Ok(ParsedLine {
            line_number: self.line_number,
            label,
            statement,
            column,
        })
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        match self.stream.peek_type().clone() {
            TokenType::MacroCall { name, args } => {
                self.stream.advance();
                Ok(Statement::MacroCall { name, args })
            }
            TokenType::Dot => {
                self.stream.advance();
                match self.stream.peek_type().clone() {
                    TokenType::Identifier(keyword) => {
                        self.stream.advance();
                        self.directive(&keyword)
                            .unwrap_or_else(|| Err(self.error(format!("unknown directive '.{}'", keyword))))
                    }
                    _ => Err(self.unexpected("directive name")),
                }
            }
            TokenType::Identifier(word) => {
                self.stream.advance();
                if self.equate_follows() {
                    validate_label(&word).map_err(|message| self.error(message))?;
                    return Ok(Statement::Equate {
                        name: word,
                        expr: self.expr()?,
                    });
                }
                match self.directive(&word) {
                    Some(result) => result,
                    None => self.instruction(word),
                }
            }
            _ => Err(self.unexpected("instruction, directive or label")),
        }
    }

    /// Consumes `=` or `EQU` if that is what follows.
    fn equate_follows(&mut self) -> bool {
        self.stream.skip_whitespace();
        match self.stream.peek_type() {
            TokenType::Equal => {
                self.stream.advance();
                true
            }
            TokenType::Identifier(word) if word.eq_ignore_ascii_case("EQU") => {
                self.stream.advance();
                true
            }
            _ => false,
        }
    }

    /// Parses the directive named `keyword`; `None` when it is not one.
    fn directive(&mut self, keyword: &str) -> Option<Result<Statement, ParseError>> {
        let statement = match keyword.to_ascii_uppercase().as_str() {
            "ORG" => self.expr().map(Statement::Origin),
            "DB" | "BYTE" => self.data_list().map(Statement::Bytes),
            "DW" | "WORD" => self.word_list().map(Statement::Words),
            _ => return None,
        };
        Some(statement)
    }

    fn data_list(&mut self) -> Result<Vec<DataItem>, ParseError> {
        let mut items = Vec::new();
        loop {
            self.stream.skip_whitespace();
            if let TokenType::StringLiteral(bytes) = self.stream.peek_type().clone() {
                self.stream.advance();
                items.push(DataItem::Bytes(bytes));
            } else {
                items.push(DataItem::Expr(self.expr()?));
            }
            if !self.comma() {
                return Ok(items);
            }
        }
    }

    fn word_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut words = vec![self.expr()?];
        while self.comma() {
            words.push(self.expr()?);
        }
        Ok(words)
    }

    fn comma(&mut self) -> bool {
        self.stream.skip_whitespace();
        if matches!(self.stream.peek_type(), TokenType::Comma) {
            self.stream.advance();
            true
        } else {
            false
        }
    }

    fn register(&mut self) -> Option<IndexRegister> {
        self.stream.skip_whitespace();
        let register = match self.stream.peek_type() {
            TokenType::Identifier(r) if r.eq_ignore_ascii_case("X") => IndexRegister::X,
            TokenType::Identifier(r) if r.eq_ignore_ascii_case("Y") => IndexRegister::Y,
            _ => return None,
        };
        self.stream.advance();
        Some(register)
    }

    fn close_paren(&mut self) -> Result<(), ParseError> {
        self.stream.skip_whitespace();
        if matches!(self.stream.peek_type(), TokenType::RParen) {
            self.stream.advance();
            Ok(())
        } else {
            Err(self.unexpected("')'"))
        }
    }

    fn instruction(&mut self, mnemonic: String) -> Result<Statement, ParseError> {
        if self.stream.at_line_end() {
            return Ok(Statement::Instruction {
                mnemonic,
                syntax: OperandSyntax::None,
                expr: None,
            });
        }

        let (syntax, expr) = match self.stream.peek_type().clone() {
            TokenType::Identifier(r)
                if r.eq_ignore_ascii_case("A")
                    && matches!(
                        self.stream.peek_n(1).map(|t| &t.token_type),
                        Some(TokenType::Whitespace | TokenType::Comment(_) | TokenType::Newline | TokenType::Eof)
                    ) =>
            {
                self.stream.advance();
                (OperandSyntax::Accumulator, None)
            }
            TokenType::Hash => {
                self.stream.advance();
                (OperandSyntax::Immediate, Some(self.expr()?))
            }
            TokenType::LParen => {
                self.stream.advance();
                let expr = self.expr()?;
                let syntax = if self.comma() {
                    if self.register() != Some(IndexRegister::X) {
                        return Err(self.unexpected("X"));
                    }
                    self.close_paren()?;
                    OperandSyntax::IndirectX
                } else {
                    self.close_paren()?;
                    if self.comma() {
                        if self.register() != Some(IndexRegister::Y) {
                            return Err(self.unexpected("Y"));
                        }
                        OperandSyntax::IndirectY
                    } else {
                        OperandSyntax::Indirect
                    }
                };
                (syntax, Some(expr))
            }
            _ => {
                let expr = self.expr()?;
                let force_absolute = self.force_absolute_suffix()?;
                let index = if self.comma() {
                    match self.register() {
                        Some(register) => Some(register),
                        None => return Err(self.unexpected("X or Y")),
                    }
                } else {
                    None
                };
                (
                    OperandSyntax::Direct {
                        index,
                        force_absolute,
                    },
                    Some(expr),
                )
            }
        };

        Ok(Statement::Instruction {
            mnemonic,
            syntax,
            expr,
        })
    }

    /// `.a` directly after a direct operand.
    fn force_absolute_suffix(&mut self) -> Result<bool, ParseError> {
        if !matches!(self.stream.peek_type(), TokenType::Dot) {
            return Ok(false);
        }
        self.stream.advance();
        match self.stream.peek_type() {
            TokenType::Identifier(s) if s.eq_ignore_ascii_case("a") => {
                self.stream.advance();
                Ok(true)
            }
            _ => Err(self.unexpected("'a' after '.'")),
        }
    }
}
