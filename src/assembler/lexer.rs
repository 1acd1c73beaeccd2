//! Lexical analysis for 6502 assembly source
//!
//! This module provides the first phase of assembly: converting source text into
//! a stream of typed tokens. The lexer separates character-level concerns (what is
//! a number? where does a comment start?) from syntactic analysis (is this a valid
//! instruction?).
//!
//! # Architecture
//!
//! 1. **Tokenization** ([`tokenize`]): Converts source text into [`Token`] vector
//! 2. **Consumption** ([`TokenStream`]): Parser navigates tokens with lookahead
//!
//! Identifiers keep their original spelling: labels are case-sensitive, while
//! mnemonics and directive keywords are compared case-insensitively by the parser.
//!
//! A macro invocation (`@name args...`) is lexed as a single token carrying the
//! raw argument text, since macro arguments are not assembly expressions.
//!
//! # Examples
//!
//! ```
//! use tool6502::assembler::lexer::{tokenize, TokenType};
//!
//! let tokens = tokenize("loop: LDA #$42 ; load").unwrap();
//!
//! assert_eq!(tokens[0].token_type, TokenType::Identifier("loop".to_string()));
//! assert_eq!(tokens[1].token_type, TokenType::Colon);
//! assert_eq!(tokens[5].token_type, TokenType::Hash);
//! assert_eq!(tokens[6].token_type, TokenType::HexNumber(0x42));
//! ```

/// Lexical error with its source location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexerError {
    #[error("invalid hex digit '{ch}'")]
    InvalidHexDigit { ch: char, line: usize, column: usize },

    #[error("expected hex digits after '$'")]
    MissingHexDigits { line: usize, column: usize },

    #[error("invalid binary digit '{ch}'")]
    InvalidBinaryDigit { ch: char, line: usize, column: usize },

    #[error("number too large: {value} (max {max})")]
    NumberTooLarge {
        value: String,
        max: u16,
        line: usize,
        column: usize,
    },

    #[error("unterminated string literal")]
    UnterminatedString { line: usize, column: usize },

    #[error("malformed character literal")]
    BadCharLiteral { line: usize, column: usize },

    #[error("expected macro name after '@'")]
    MissingMacroName { line: usize, column: usize },

    #[error("unexpected character '{ch}'")]
    UnexpectedCharacter { ch: char, line: usize, column: usize },
}

impl LexerError {
    /// (line, column) the error was detected at.
    pub fn location(&self) -> (usize, usize) {
        match *self {
            LexerError::InvalidHexDigit { line, column, .. }
            | LexerError::MissingHexDigits { line, column }
            | LexerError::InvalidBinaryDigit { line, column, .. }
            | LexerError::NumberTooLarge { line, column, .. }
            | LexerError::UnterminatedString { line, column }
            | LexerError::BadCharLiteral { line, column }
            | LexerError::MissingMacroName { line, column }
            | LexerError::UnexpectedCharacter { line, column, .. } => (line, column),
        }
    }
}

/// Single-character token types (operators and punctuation)
#[derive(Debug, Clone, Copy, PartialEq)]
enum SingleCharTokenType {
    Colon,
    Comma,
    Hash,
    Equal,
    LParen,
    RParen,
    Dot,
    Plus,
    Minus,
    Less,
    Greater,
    Star,
}

impl SingleCharTokenType {
    /// Try to convert a character to a single-char token type
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            ':' => Some(Self::Colon),
            ',' => Some(Self::Comma),
            '#' => Some(Self::Hash),
            '=' => Some(Self::Equal),
            '(' => Some(Self::LParen),
            ')' => Some(Self::RParen),
            '.' => Some(Self::Dot),
            '+' => Some(Self::Plus),
            '-' => Some(Self::Minus),
            '<' => Some(Self::Less),
            '>' => Some(Self::Greater),
            '*' => Some(Self::Star),
            _ => None,
        }
    }

    /// Convert to public TokenType
    fn to_token_type(self) -> TokenType {
        match self {
            Self::Colon => TokenType::Colon,
            Self::Comma => TokenType::Comma,
            Self::Hash => TokenType::Hash,
            Self::Equal => TokenType::Equal,
            Self::LParen => TokenType::LParen,
            Self::RParen => TokenType::RParen,
            Self::Dot => TokenType::Dot,
            Self::Plus => TokenType::Plus,
            Self::Minus => TokenType::Minus,
            Self::Less => TokenType::Less,
            Self::Greater => TokenType::Greater,
            Self::Star => TokenType::Star,
        }
    }
}

/// Classification of lexical tokens in 6502 assembly
#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    /// Identifiers: mnemonics, labels, directive names (original case kept)
    Identifier(String),

    /// Decimal number literal (0-65535)
    DecimalNumber(u16),
    /// Hexadecimal number literal with $ prefix
    HexNumber(u16),
    /// Binary number literal with % prefix
    BinaryNumber(u16),
    /// Character literal `'c'`
    CharLiteral(u8),
    /// Double-quoted string with escapes already processed
    StringLiteral(Vec<u8>),

    /// `@name rest-of-line`; `args` is the raw text up to a comment
    MacroCall { name: String, args: String },

    /// Colon `:` - label definition suffix
    Colon,
    /// Comma `,` - operand separator, indexed addressing
    Comma,
    /// Hash `#` - immediate mode prefix
    Hash,
    /// Equal `=` - constant assignment operator
    Equal,
    /// Left parenthesis `(` - indirect addressing open
    LParen,
    /// Right parenthesis `)` - indirect addressing close
    RParen,
    /// Dot `.` - directive prefix, force-absolute suffix
    Dot,
    Plus,
    Minus,
    /// `<` low byte operator
    Less,
    /// `>` high byte operator
    Greater,
    /// `*` current address
    Star,

    /// Whitespace (spaces/tabs)
    Whitespace,
    /// Line terminator (CRLF or LF normalized to single token)
    Newline,
    /// Comment text after semicolon (excluding `;` itself)
    Comment(String),
    /// End of file marker
    Eof,
}

/// A single lexical token with type, value, and source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token classification and optional parsed value
    pub token_type: TokenType,

    /// Source line number (1-indexed for user display)
    pub line: usize,

    /// Column offset within line (0-indexed)
    pub column: usize,

    /// Character span (for error highlighting)
    pub length: usize,
}

/// Lexer state for converting source text into tokens
pub struct Lexer<'a> {
    /// Reference to original source text (lifetime-bound)
    source: &'a str,

    /// Iterator over (byte_offset, char) pairs
    chars: std::str::CharIndices<'a>,

    /// Current character being examined
    current: Option<(usize, char)>,

    /// Current line number
    line: usize,

    /// Byte offset where current line begins
    line_start: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source text
    pub fn new(source: &'a str) -> Self {
        Self::starting_at_line(source, 1)
    }

    /// Create a lexer whose first line is numbered `line`.
    pub fn starting_at_line(source: &'a str, line: usize) -> Self {
        let mut chars = source.char_indices();
        let current = chars.next();
        Lexer {
            source,
            chars,
            current,
            line,
            line_start: 0,
        }
    }

    /// Advance to the next character in the source
    fn advance(&mut self) {
        self.current = self.chars.next();
    }

    /// Peek at the current character without consuming it
    fn peek(&self) -> Option<char> {
        self.current.map(|(_, ch)| ch)
    }

    /// Calculate the current column offset (0-indexed)
    fn column(&self) -> usize {
        match self.current {
            Some((pos, _)) => pos - self.line_start,
            None => self.source.len() - self.line_start,
        }
    }

    fn token(&self, token_type: TokenType, start_col: usize) -> Token {
        Token {
            token_type,
            line: self.line,
            column: start_col,
            length: self.column().saturating_sub(start_col),
        }
    }

    /// Scan an identifier: [a-zA-Z_][a-zA-Z0-9_]*
    fn scan_identifier(&mut self, start_col: usize) -> Token {
        let mut identifier = String::new();

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        self.token(TokenType::Identifier(identifier), start_col)
    }

    /// Scan the digits of a number in `radix` (prefix already consumed).
    fn scan_digits(&mut self, radix: u32) -> String {
        let mut digits = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_digit(radix) {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        digits
    }

    /// Scan a hexadecimal number: $[0-9A-Fa-f]+
    fn scan_hex_number(&mut self, start_col: usize) -> Result<Token, LexerError> {
        let hex_str = self.scan_digits(16);

        // Invalid hex digit (alphanumeric but not hex)
        if let Some(ch) = self.peek().filter(|c| c.is_ascii_alphanumeric() || *c == '_') {
            return Err(LexerError::InvalidHexDigit {
                ch,
                line: self.line,
                column: self.column(),
            });
        }

        if hex_str.is_empty() {
            return Err(LexerError::MissingHexDigits {
                line: self.line,
                column: self.column(),
            });
        }

        let value = u16::from_str_radix(&hex_str, 16).map_err(|_| LexerError::NumberTooLarge {
            value: format!("${}", hex_str),
            max: u16::MAX,
            line: self.line,
            column: start_col,
        })?;

        Ok(self.token(TokenType::HexNumber(value), start_col))
    }

    /// Scan a binary number: %[01]+
    fn scan_binary_number(&mut self, start_col: usize) -> Result<Token, LexerError> {
        let bin_str = self.scan_digits(2);

        if let Some(ch) = self.peek().filter(|c| c.is_ascii_digit()) {
            return Err(LexerError::InvalidBinaryDigit {
                ch,
                line: self.line,
                column: self.column(),
            });
        }

        let value = u16::from_str_radix(&bin_str, 2).map_err(|_| LexerError::NumberTooLarge {
            value: format!("%{}", bin_str),
            max: u16::MAX,
            line: self.line,
            column: start_col,
        })?;

        Ok(self.token(TokenType::BinaryNumber(value), start_col))
    }

    /// Scan a decimal number: [0-9]+
    fn scan_decimal_number(&mut self, start_col: usize) -> Result<Token, LexerError> {
        let num_str = self.scan_digits(10);

        let value: u16 = num_str.parse().map_err(|_| LexerError::NumberTooLarge {
            value: num_str.clone(),
            max: u16::MAX,
            line: self.line,
            column: start_col,
        })?;

        Ok(self.token(TokenType::DecimalNumber(value), start_col))
    }

    /// Read one possibly escaped character inside a string or char literal.
    fn scan_escaped_char(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.advance();
        if ch != '\\' {
            return u8::try_from(ch as u32).ok();
        }
        let escaped = self.peek()?;
        self.advance();
        match escaped {
            'n' => Some(b'\n'),
            'r' => Some(b'\r'),
            't' => Some(b'\t'),
            '0' => Some(0),
            '\\' => Some(b'\\'),
            '"' => Some(b'"'),
            '\'' => Some(b'\''),
            other => u8::try_from(other as u32).ok(),
        }
    }

    /// Scan a string: "..." (opening quote already consumed)
    fn scan_string(&mut self, start_col: usize) -> Result<Token, LexerError> {
        let mut bytes = Vec::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    return Ok(self.token(TokenType::StringLiteral(bytes), start_col));
                }
                Some('\n') | Some('\r') | None => {
                    return Err(LexerError::UnterminatedString {
                        line: self.line,
                        column: start_col,
                    })
                }
                Some(_) => match self.scan_escaped_char() {
                    Some(byte) => bytes.push(byte),
                    None => {
                        return Err(LexerError::UnterminatedString {
                            line: self.line,
                            column: start_col,
                        })
                    }
                },
            }
        }
    }

    /// Scan a character literal: 'c' (opening quote already consumed)
    fn scan_char_literal(&mut self, start_col: usize) -> Result<Token, LexerError> {
        let bad = LexerError::BadCharLiteral {
            line: self.line,
            column: start_col,
        };
        if matches!(self.peek(), Some('\'') | Some('\n') | None) {
            return Err(bad);
        }
        let value = self.scan_escaped_char().ok_or(bad.clone())?;
        if self.peek() != Some('\'') {
            return Err(bad);
        }
        self.advance();
        Ok(self.token(TokenType::CharLiteral(value), start_col))
    }

    /// Scan `@name args` up to a comment or end of line (outside quotes).
    fn scan_macro_call(&mut self, start_col: usize) -> Result<Token, LexerError> {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(LexerError::MissingMacroName {
                line: self.line,
                column: self.column(),
            });
        }

        let mut args = String::new();
        let mut quote: Option<char> = None;
        while let Some(ch) = self.peek() {
            match (ch, quote) {
                ('\n' | '\r', _) => break,
                (';', None) => break,
                ('"' | '\'', None) => quote = Some(ch),
                (c, Some(q)) if c == q => quote = None,
                _ => {}
            }
            args.push(ch);
            self.advance();
        }

        Ok(self.token(
            TokenType::MacroCall {
                name,
                args: args.trim().to_string(),
            },
            start_col,
        ))
    }

    /// Scan a comment: ;.* until newline
    fn scan_comment(&mut self, start_col: usize) -> Token {
        let mut comment = String::new();

        while let Some(ch) = self.peek() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            comment.push(ch);
            self.advance();
        }

        self.token(TokenType::Comment(comment), start_col)
    }

    /// Get the next token from the source
    fn next_token(&mut self) -> Result<Option<Token>, LexerError> {
        let Some(ch) = self.peek() else {
            // End of file
            return Ok(None);
        };

        let start_col = self.column();

        match ch {
            // Whitespace (spaces and tabs)
            ' ' | '\t' => {
                while matches!(self.peek(), Some(' ') | Some('\t')) {
                    self.advance();
                }
                Ok(Some(self.token(TokenType::Whitespace, start_col)))
            }

            // Newline (handle both CRLF and LF)
            '\n' | '\r' => {
                self.advance();
                if ch == '\r' && self.peek() == Some('\n') {
                    self.advance();
                }

                let token = Token {
                    token_type: TokenType::Newline,
                    line: self.line,
                    column: start_col,
                    length: 1,
                };

                // Update line tracking
                self.line += 1;
                self.line_start = self
                    .current
                    .map(|(pos, _)| pos)
                    .unwrap_or(self.source.len());

                Ok(Some(token))
            }

            ';' => {
                self.advance();
                Ok(Some(self.scan_comment(start_col)))
            }

            '$' => {
                self.advance();
                Ok(Some(self.scan_hex_number(start_col)?))
            }

            '%' => {
                self.advance();
                Ok(Some(self.scan_binary_number(start_col)?))
            }

            '"' => {
                self.advance();
                Ok(Some(self.scan_string(start_col)?))
            }

            '\'' => {
                self.advance();
                Ok(Some(self.scan_char_literal(start_col)?))
            }

            '@' => {
                self.advance();
                Ok(Some(self.scan_macro_call(start_col)?))
            }

            '0'..='9' => Ok(Some(self.scan_decimal_number(start_col)?)),

            'a'..='z' | 'A'..='Z' | '_' => Ok(Some(self.scan_identifier(start_col))),

            _ => match SingleCharTokenType::from_char(ch) {
                Some(single) => {
                    self.advance();
                    Ok(Some(self.token(single.to_token_type(), start_col)))
                }
                None => Err(LexerError::UnexpectedCharacter {
                    ch,
                    line: self.line,
                    column: start_col,
                }),
            },
        }
    }
}

/// Tokenize assembly source text into a vector of tokens
///
/// All lexical errors are collected; after an error the lexer skips to the next
/// whitespace, newline or comment and carries on.
///
/// # Examples
/// ```
/// use tool6502::assembler::lexer::tokenize;
///
/// let tokens = tokenize("LDA #$42").unwrap();
/// assert_eq!(tokens.len(), 5); // LDA, whitespace, #, $42, EOF
/// assert!(tokenize("LDA $ZZ").is_err());
/// ```
pub fn tokenize(source: &str) -> Result<Vec<Token>, Vec<LexerError>> {
    tokenize_from_line(source, 1)
}

/// Tokenize with line numbering starting at `first_line`.
pub fn tokenize_from_line(source: &str, first_line: usize) -> Result<Vec<Token>, Vec<LexerError>> {
    let mut lexer = Lexer::starting_at_line(source, first_line);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    loop {
        match lexer.next_token() {
            Ok(Some(token)) => tokens.push(token),
            Ok(None) => {
                tokens.push(Token {
                    token_type: TokenType::Eof,
                    line: lexer.line,
                    column: lexer.column(),
                    length: 0,
                });
                break;
            }
            Err(err) => {
                errors.push(err);
                // Recover at the next synchronization point
                while let Some(ch) = lexer.peek() {
                    if matches!(ch, ' ' | '\t' | '\n' | '\r' | ';') {
                        break;
                    }
                    lexer.advance();
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

/// Token stream with lookahead capability for parser consumption
pub struct TokenStream {
    /// Complete token sequence (pre-parsed by lexer)
    tokens: Vec<Token>,

    /// Current read position (index into tokens vec)
    position: usize,
}

impl TokenStream {
    /// Create a new token stream from a vector of tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        TokenStream {
            tokens,
            position: 0,
        }
    }

    /// Peek at the current token without consuming it
    #[must_use]
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Peek ahead n tokens without consuming them; peek_n(0) is peek().
    #[must_use]
    pub fn peek_n(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    /// Type of the current token, or `Eof` past the end.
    #[must_use]
    pub fn peek_type(&self) -> &TokenType {
        self.peek().map(|t| &t.token_type).unwrap_or(&TokenType::Eof)
    }

    /// Advance the stream position by one token without returning it
    pub fn advance(&mut self) -> bool {
        if self.position < self.tokens.len() {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Consume and return the current token, advancing the stream
    pub fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned()?;
        self.position += 1;
        Some(token)
    }

    /// Skip spaces and tabs, but not newlines
    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek_type(), TokenType::Whitespace) {
            self.position += 1;
        }
    }

    /// True at a comment, newline or EOF (after skipping spaces)
    pub fn at_line_end(&mut self) -> bool {
        self.skip_whitespace();
        matches!(
            self.peek_type(),
            TokenType::Comment(_) | TokenType::Newline | TokenType::Eof
        )
    }

    /// Check if the stream is at end of file
    #[must_use = "calling is_eof() without using the result has no effect"]
    pub fn is_eof(&self) -> bool {
        matches!(self.peek_type(), TokenType::Eof)
    }

    /// Get the current token's source location for error reporting
    #[must_use]
    pub fn current_location(&self) -> (usize, usize) {
        match self.peek().or_else(|| self.tokens.last()) {
            Some(token) => (token.line, token.column),
            None => (0, 0),
        }
    }
}
