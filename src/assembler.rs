//! # 6502 Assembler
//!
//! Converts assembly language source code into a sparse object code image.
//!
//! Assembly makes two full passes over the source:
//!
//! 1. **Pass 1** walks every line with a running address cursor, records
//!    labels and equates in the symbol table and commits each instruction's
//!    addressing mode. An operand that is still a forward reference is
//!    committed to the absolute form, so no instruction can shrink later and
//!    move labels that were already recorded.
//! 2. **Pass 2** walks the same lines again with the complete symbol table,
//!    evaluates every operand, range-checks it against the committed mode and
//!    writes bytes into the [`ObjectCode`] image. Commits are looked up by
//!    source position (line, then line within each macro expansion) and only
//!    reused when the mnemonic and operand shape still match.
//!
//! Errors are collected per line; a line that failed in pass 1 is not
//! re-reported in pass 2. The image is only returned when both passes finish
//! without errors.
//!
//! # Examples
//!
//! ```
//! use tool6502::assembler::assemble;
//!
//! let output = assemble("ORG $0200\nstart: LDA #$55\nSTA $10\nBRK").unwrap();
//!
//! assert_eq!(output.bytes(), vec![0xA9, 0x55, 0x85, 0x10, 0x00]);
//! assert_eq!(output.lookup_symbol_addr("start"), Some(0x0200));
//! ```

pub mod builtin_macros;
pub mod encoder;
pub mod expression;
pub mod lexer;
pub mod listing;
pub mod macros;
pub mod parser;
pub mod symbol_table;

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::object_code::ObjectCode;
use crate::opcodes::OpcodeMetadata;
use crate::resolver::{needs_force_absolute, resolve, OperandSyntax, ResolveError};
use encoder::{encode_byte, encode_instruction, encode_word, EncodeError};
use expression::{EvalError, Expr};
use listing::{Listing, ListingLine};
use macros::{MacroContext, MacroOutput, MacroRegistry};
use parser::{parse_line, DataItem, ParseError, ParsedLine, Statement};
use symbol_table::SymbolTable;

/// A symbol table entry mapping a label or equate to its value
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Name, case-sensitive
    pub name: String,

    /// Resolved 16-bit value
    pub address: u16,

    /// Source line where the symbol was defined
    pub defined_at: usize,
}

/// A non-fatal warning from the assembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerWarning {
    /// Line number where warning occurred
    pub line: usize,

    /// Warning message
    pub message: String,
}

/// An error encountered during assembly
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {error_type}: {message}")]
pub struct AssemblerError {
    /// Error type classification
    pub error_type: ErrorType,

    /// Line number where error occurred (1-indexed)
    pub line: usize,

    /// Column number where error starts (0-indexed)
    pub column: usize,

    /// Pass (1 or 2) that detected the error
    pub pass: u8,

    /// Human-readable error message
    pub message: String,
}

/// Classification of assembly errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Unparseable line, unknown mnemonic or unsupported operand syntax
    SyntaxError,

    /// Symbol still undefined when its value is needed
    UndefinedSymbol,

    /// Symbol redefined with a different value
    DuplicateSymbol,

    /// Two emissions target the same address
    AddressOverlap,

    /// Relative branch offset outside -128..=127
    BranchRange,

    /// Failure reported by, or caused by, a macro expansion
    MacroExpansion,

    /// Value does not fit where it is used, or the cursor passed $FFFF
    ValueRange,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorType::SyntaxError => "syntax error",
            ErrorType::UndefinedSymbol => "undefined symbol",
            ErrorType::DuplicateSymbol => "duplicate symbol",
            ErrorType::AddressOverlap => "address overlap",
            ErrorType::BranchRange => "branch out of range",
            ErrorType::MacroExpansion => "macro expansion",
            ErrorType::ValueRange => "value out of range",
        };
        f.write_str(name)
    }
}

/// Where the assembler is in its two passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssemblyState {
    /// Nothing assembled yet
    #[default]
    Idle,
    Pass1Scanning,
    Pass2Emitting,
    Done,
    /// Finished with errors; holds the kind of the first one
    Failed(ErrorType),
}

/// Assembler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// 0 = quiet, 1 = pass summaries, 2+ = per-line detail
    pub debug_level: u8,

    /// How deep macro output may itself invoke macros
    pub max_macro_depth: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            debug_level: 0,
            max_macro_depth: 8,
        }
    }
}

/// Complete output from assembling source code
#[derive(Debug, Clone)]
pub struct AssemblerOutput {
    /// Assembled bytes; unassigned cells are holes
    pub object_code: ObjectCode,

    /// All labels and equates
    pub symbols: SymbolTable,

    pub listing: Listing,

    /// Non-fatal warnings encountered during assembly
    pub warnings: Vec<AssemblerWarning>,
}

impl AssemblerOutput {
    /// Assigned address range as a flat byte vector, holes filled with 0x00.
    pub fn bytes(&self) -> Vec<u8> {
        self.object_code.to_binary(0x00)
    }

    /// Lowest assigned address, if anything was emitted.
    pub fn start_address(&self) -> Option<u16> {
        self.object_code.assigned_range().map(|r| *r.start())
    }

    /// Look up a symbol's value by name
    pub fn lookup_symbol_addr(&self, name: &str) -> Option<u16> {
        self.symbols.lookup_symbol(name).map(|s| s.address)
    }

    /// Symbol file text, one `NAME = $HHHH (DEC)` line per symbol.
    pub fn symbol_file(&self) -> String {
        self.symbols.to_symbol_file()
    }

    pub fn listing_text(&self) -> String {
        self.listing.to_text()
    }
}

/// Two-pass assembler with a configurable macro registry.
///
/// ```
/// use tool6502::assembler::{Assembler, AssemblerConfig, AssemblyState};
///
/// let mut assembler = Assembler::new(AssemblerConfig::default());
/// let output = assembler.assemble("ORG $1000\n@text_string \"Hi\"").unwrap();
///
/// assert_eq!(output.bytes(), vec![b'H', b'i', 0]);
/// assert_eq!(assembler.state(), AssemblyState::Done);
/// ```
#[derive(Debug)]
pub struct Assembler {
    config: AssemblerConfig,
    macros: MacroRegistry,
    state: AssemblyState,
}

impl Assembler {
    /// Creates an assembler with the built-in macros registered.
    pub fn new(config: AssemblerConfig) -> Self {
        Self::with_macros(config, MacroRegistry::with_builtins())
    }

    pub fn with_macros(config: AssemblerConfig, macros: MacroRegistry) -> Self {
        Self {
            config,
            macros,
            state: AssemblyState::Idle,
        }
    }

    /// State reached by the most recent [`assemble`](Self::assemble) call.
    pub fn state(&self) -> AssemblyState {
        self.state
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    pub fn macros_mut(&mut self) -> &mut MacroRegistry {
        &mut self.macros
    }

    /// Assemble source code into an object code image
    ///
    /// Returns every error found across both passes, sorted by line.
    pub fn assemble(&mut self, source: &str) -> Result<AssemblerOutput, Vec<AssemblerError>> {
        let lines: Vec<(Result<ParsedLine, ParseError>, &str)> = source
            .lines()
            .enumerate()
            .map(|(index, text)| (parse_line(text, index + 1), text))
            .collect();

        let mut session = Session::new(&self.config, &self.macros);

        self.state = AssemblyState::Pass1Scanning;
        tracing::trace!("starting pass 1");
        session.run_pass(1, &lines);
        session.resolve_pending_equates();
        if self.config.debug_level >= 1 {
            tracing::debug!(
                symbols = session.symbols.len(),
                errors = session.errors.len(),
                "pass 1 complete"
            );
        }

        self.state = AssemblyState::Pass2Emitting;
        tracing::trace!("starting pass 2");
        session.run_pass(2, &lines);
        if self.config.debug_level >= 1 {
            tracing::debug!(
                bytes = session.object_code.assigned_count(),
                errors = session.errors.len(),
                "pass 2 complete"
            );
        }

        let Session {
            symbols,
            object_code,
            listing,
            warnings,
            mut errors,
            ..
        } = session;

        for warning in &warnings {
            tracing::warn!(line = warning.line, "{}", warning.message);
        }

        if let Some(first) = errors.first() {
            self.state = AssemblyState::Failed(first.error_type);
            errors.sort_by_key(|e| e.line);
            return Err(errors);
        }

        self.state = AssemblyState::Done;
        Ok(AssemblerOutput {
            object_code,
            symbols,
            listing,
            warnings,
        })
    }
}

/// Assemble with the default configuration and the built-in macros.
pub fn assemble(source: &str) -> Result<AssemblerOutput, Vec<AssemblerError>> {
    Assembler::new(AssemblerConfig::default()).assemble(source)
}

/// Addressing decision made in pass 1 and reused in pass 2.
#[derive(Debug, Clone)]
struct Commit {
    metadata: &'static OpcodeMetadata,
    /// Operand was a forward reference when the mode was chosen
    forward: bool,
    mnemonic: String,
    syntax: OperandSyntax,
}

impl Commit {
    /// Whether the line seen in pass 2 is the one this decision was made for
    fn matches(&self, mnemonic: &str, syntax: OperandSyntax) -> bool {
        self.syntax == syntax && self.mnemonic.eq_ignore_ascii_case(mnemonic)
    }
}

/// Where a statement sits: its source line, then its line index within each
/// enclosing macro expansion.
type Position = (usize, Vec<usize>);

#[derive(Debug)]
struct PendingEquate {
    name: String,
    expr: Expr,
    line: usize,
    column: usize,
    address: u16,
}

/// Mutable state of one `assemble` call.
struct Session<'a> {
    config: &'a AssemblerConfig,
    macros: &'a MacroRegistry,

    pass: u8,
    /// Address cursor; may run past $FFFF, which is reported on emission
    pc: u32,
    origin: u16,

    symbols: SymbolTable,
    pending_equates: Vec<PendingEquate>,

    /// `None` for instructions that failed to resolve in pass 1
    commits: HashMap<Position, Option<Commit>>,
    /// Pass 1 sizes of macro expansions
    macro_sizes: HashMap<Position, usize>,
    expansion_path: Vec<usize>,

    object_code: ObjectCode,
    listing: Listing,
    warnings: Vec<AssemblerWarning>,
    errors: Vec<AssemblerError>,
    failed_lines: HashSet<usize>,
}

impl<'a> Session<'a> {
    fn new(config: &'a AssemblerConfig, macros: &'a MacroRegistry) -> Self {
        Self {
            config,
            macros,
            pass: 1,
            pc: 0,
            origin: 0,
            symbols: SymbolTable::new(),
            pending_equates: Vec::new(),
            commits: HashMap::new(),
            macro_sizes: HashMap::new(),
            expansion_path: Vec::new(),
            object_code: ObjectCode::new(),
            listing: Listing::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            failed_lines: HashSet::new(),
        }
    }

    fn error(&mut self, error_type: ErrorType, line: usize, column: usize, message: String) {
        if self.pass == 1 {
            self.failed_lines.insert(line);
        } else if self.failed_lines.contains(&line) {
            return;
        }

        if self.config.debug_level >= 2 {
            tracing::debug!(pass = self.pass, line, %error_type, "{}", message);
        }

        self.errors.push(AssemblerError {
            error_type,
            line,
            column,
            pass: self.pass,
            message,
        });
    }

    fn run_pass(&mut self, pass: u8, lines: &[(Result<ParsedLine, ParseError>, &str)]) {
        self.pass = pass;
        self.pc = 0;
        self.origin = 0;
        self.expansion_path.clear();

        for (parsed, source) in lines {
            match parsed {
                Ok(line) => {
                    let start = self.pc;
                    let bytes = self.process_line(line, 0);
                    if pass == 2 {
                        self.listing.push(ListingLine {
                            line_number: line.line_number,
                            address: u16::try_from(start).ok(),
                            bytes,
                            source: source.trim_end().to_string(),
                        });
                    }
                }
                Err(err) => {
                    self.error(ErrorType::SyntaxError, err.line, err.column, err.message.clone());
                }
            }
        }
    }

    /// Processes one line; returns the bytes emitted (pass 2 only).
    fn process_line(&mut self, line: &ParsedLine, depth: usize) -> Vec<u8> {
        if self.config.debug_level >= 2 {
            tracing::trace!(
                pass = self.pass,
                line = line.line_number,
                pc = format_args!("${:04X}", self.pc),
                "processing line"
            );
        }

        if let Some(label) = &line.label {
            self.define_label(label, line.line_number);
        }

        match &line.statement {
            None => Vec::new(),
            Some(Statement::Origin(expr)) => {
                self.origin_directive(expr, line);
                Vec::new()
            }
            Some(Statement::Equate { name, expr }) => {
                if self.pass == 1 {
                    self.equate(name, expr, line);
                }
                Vec::new()
            }
            Some(Statement::Bytes(items)) => self.data_bytes(items, line),
            Some(Statement::Words(words)) => self.data_words(words, line),
            Some(Statement::Instruction {
                mnemonic,
                syntax,
                expr,
            }) => self.instruction(mnemonic, *syntax, expr.as_ref(), line),
            Some(Statement::MacroCall { name, args }) => self.macro_call(name, args, line, depth),
        }
    }

    fn define_label(&mut self, label: &str, line: usize) {
        let Ok(address) = u16::try_from(self.pc) else {
            self.error(
                ErrorType::ValueRange,
                line,
                0,
                format!("label '{}' is past $FFFF", label),
            );
            return;
        };

        if self.pass == 1 {
            if let Err(existing) = self.symbols.define(label, address, line) {
                self.error(
                    ErrorType::DuplicateSymbol,
                    line,
                    0,
                    format!(
                        "'{}' already defined as ${:04X} at line {}",
                        label, existing.address, existing.defined_at
                    ),
                );
            }
        }
    }

    /// Evaluates an operand, reporting an undefined symbol as an error.
    fn evaluate(&mut self, expr: &Expr, line: &ParsedLine) -> Option<i32> {
        match expr.evaluate(&self.symbols, self.pc as u16) {
            Ok(value) => Some(value),
            Err(EvalError::Undefined(name)) => {
                self.error(
                    ErrorType::UndefinedSymbol,
                    line.line_number,
                    line.column,
                    format!("undefined symbol '{}'", name),
                );
                None
            }
        }
    }

    fn origin_directive(&mut self, expr: &Expr, line: &ParsedLine) {
        let Some(value) = self.evaluate(expr, line) else {
            return;
        };
        match u16::try_from(value) {
            Ok(address) => {
                self.pc = address as u32;
                self.origin = address;
            }
            Err(_) => self.error(
                ErrorType::ValueRange,
                line.line_number,
                line.column,
                format!("origin {} is not a 16-bit address", value),
            ),
        }
    }

    fn equate(&mut self, name: &str, expr: &Expr, line: &ParsedLine) {
        match expr.evaluate(&self.symbols, self.pc as u16) {
            Ok(value) => self.define_equate(name, value, line.line_number, line.column),
            Err(EvalError::Undefined(_)) => self.pending_equates.push(PendingEquate {
                name: name.to_string(),
                expr: expr.clone(),
                line: line.line_number,
                column: line.column,
                address: self.pc as u16,
            }),
        }
    }

    fn define_equate(&mut self, name: &str, value: i32, line: usize, column: usize) {
        let Ok(value) = u16::try_from(value) else {
            self.error(
                ErrorType::ValueRange,
                line,
                column,
                format!("'{}' = {} does not fit in 16 bits", name, value),
            );
            return;
        };
        if let Err(existing) = self.symbols.define(name, value, line) {
            self.error(
                ErrorType::DuplicateSymbol,
                line,
                column,
                format!(
                    "'{}' already defined as ${:04X} at line {}",
                    name, existing.address, existing.defined_at
                ),
            );
        }
    }

    /// Equates that referenced later symbols, evaluated until nothing changes.
    fn resolve_pending_equates(&mut self) {
        loop {
            let pending = std::mem::take(&mut self.pending_equates);
            let before = pending.len();

            for equate in pending {
                match equate.expr.evaluate(&self.symbols, equate.address) {
                    Ok(value) => {
                        self.define_equate(&equate.name, value, equate.line, equate.column)
                    }
                    Err(_) => self.pending_equates.push(equate),
                }
            }

            if self.pending_equates.is_empty() || self.pending_equates.len() == before {
                break;
            }
        }

        for equate in std::mem::take(&mut self.pending_equates) {
            if let Err(EvalError::Undefined(missing)) =
                equate.expr.evaluate(&self.symbols, equate.address)
            {
                self.error(
                    ErrorType::UndefinedSymbol,
                    equate.line,
                    equate.column,
                    format!("'{}' depends on undefined symbol '{}'", equate.name, missing),
                );
            }
        }
    }

    /// Pass 1 advances the cursor; pass 2 writes the bytes.
    fn emit(&mut self, bytes: Vec<u8>, line: &ParsedLine) -> Vec<u8> {
        if self.pass == 1 {
            self.pc += bytes.len() as u32;
            return Vec::new();
        }

        let mut past_end_reported = false;
        for &byte in &bytes {
            match u16::try_from(self.pc) {
                Ok(address) => {
                    if let Err(overlap) = self.object_code.write(address, byte) {
                        self.error(
                            ErrorType::AddressOverlap,
                            line.line_number,
                            line.column,
                            overlap.to_string(),
                        );
                    }
                }
                Err(_) if !past_end_reported => {
                    past_end_reported = true;
                    self.error(
                        ErrorType::ValueRange,
                        line.line_number,
                        line.column,
                        "code runs past $FFFF".to_string(),
                    );
                }
                Err(_) => {}
            }
            self.pc += 1;
        }
        bytes
    }

    fn report_encode_error(&mut self, err: EncodeError, line: &ParsedLine) {
        let error_type = match err {
            EncodeError::BranchRange(_) => ErrorType::BranchRange,
            EncodeError::ValueRange { .. } => ErrorType::ValueRange,
            EncodeError::MissingOperand => ErrorType::SyntaxError,
        };
        self.error(error_type, line.line_number, line.column, err.to_string());
    }

    fn data_bytes(&mut self, items: &[DataItem], line: &ParsedLine) -> Vec<u8> {
        let mut bytes = Vec::new();
        for item in items {
            match item {
                DataItem::Bytes(text) => bytes.extend_from_slice(text),
                DataItem::Expr(_) if self.pass == 1 => bytes.push(0),
                DataItem::Expr(expr) => {
                    let value = self.evaluate(expr, line).unwrap_or(0);
                    match encode_byte(value) {
                        Ok(byte) => bytes.push(byte),
                        Err(err) => {
                            self.report_encode_error(err, line);
                            bytes.push(0);
                        }
                    }
                }
            }
        }
        self.emit(bytes, line)
    }

    fn data_words(&mut self, words: &[Expr], line: &ParsedLine) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(words.len() * 2);
        for expr in words {
            if self.pass == 1 {
                bytes.extend_from_slice(&[0, 0]);
                continue;
            }
            let value = self.evaluate(expr, line).unwrap_or(0);
            match encode_word(value) {
                Ok(word) => bytes.extend_from_slice(&word),
                Err(err) => {
                    self.report_encode_error(err, line);
                    bytes.extend_from_slice(&[0, 0]);
                }
            }
        }
        self.emit(bytes, line)
    }

    fn instruction(
        &mut self,
        mnemonic: &str,
        syntax: OperandSyntax,
        expr: Option<&Expr>,
        line: &ParsedLine,
    ) -> Vec<u8> {
        let position = self.position(line);

        if self.pass == 1 {
            self.commit_instruction(position, mnemonic, syntax, expr, line);
            return Vec::new();
        }

        let committed = self.commits.get(&position).cloned();
        let commit = match committed {
            Some(Some(commit)) if commit.matches(mnemonic, syntax) => commit,
            // Already reported in pass 1
            Some(None) => return Vec::new(),
            // A macro produced different text this pass; size it from the
            // shape alone and leave the length to the macro size check
            _ => match Self::widest(mnemonic, syntax, expr) {
                Ok(commit) => commit,
                Err(err) => {
                    self.error(ErrorType::SyntaxError, line.line_number, line.column, err.to_string());
                    return Vec::new();
                }
            },
        };
        let size = commit.metadata.size_bytes as u32;

        let value = match expr {
            Some(expr) => match self.evaluate(expr, line) {
                Some(value) => Some(value),
                None => {
                    self.pc += size;
                    return Vec::new();
                }
            },
            None => None,
        };

        match encode_instruction(commit.metadata, value, self.pc as u16) {
            Ok(bytes) => {
                let forced = matches!(
                    syntax,
                    OperandSyntax::Direct {
                        force_absolute: true,
                        ..
                    }
                );
                if let Some(value) = value.filter(|v| (0..=0xFF).contains(v)) {
                    if commit.forward && !forced && needs_force_absolute(commit.metadata, value as u16)
                    {
                        self.warnings.push(AssemblerWarning {
                            line: line.line_number,
                            message: format!(
                                "forward reference resolved to zero page ${:02X} but {} was sized as absolute",
                                value, commit.metadata.mnemonic
                            ),
                        });
                    }
                }
                self.emit(bytes, line)
            }
            Err(err) => {
                self.report_encode_error(err, line);
                self.pc += size;
                Vec::new()
            }
        }
    }

    fn position(&self, line: &ParsedLine) -> Position {
        (line.line_number, self.expansion_path.clone())
    }

    fn commit_instruction(
        &mut self,
        position: Position,
        mnemonic: &str,
        syntax: OperandSyntax,
        expr: Option<&Expr>,
        line: &ParsedLine,
    ) {
        let (value, forward) = match expr.map(|e| (e, e.evaluate(&self.symbols, self.pc as u16))) {
            None => (None, false),
            Some((_, Ok(value))) => (u16::try_from(value).ok(), false),
            // `<label` and `>label` always fit in a byte
            Some((e, Err(_))) if e.is_byte_select() => (Some(0), true),
            Some((_, Err(_))) => (None, true),
        };

        match resolve(mnemonic, syntax, value) {
            Ok(metadata) => {
                self.pc += metadata.size_bytes as u32;
                let commit = Commit {
                    metadata,
                    forward,
                    mnemonic: mnemonic.to_string(),
                    syntax,
                };
                self.commits.insert(position, Some(commit));
            }
            Err(err) => {
                self.commits.insert(position, None);
                self.error(ErrorType::SyntaxError, line.line_number, line.column, err.to_string());
            }
        }
    }

    /// Sizing for a line pass 1 never saw: the operand value is ignored, so
    /// direct operands take their absolute form.
    fn widest(
        mnemonic: &str,
        syntax: OperandSyntax,
        expr: Option<&Expr>,
    ) -> Result<Commit, ResolveError> {
        let value = expr.filter(|e| e.is_byte_select()).map(|_| 0);
        let metadata = resolve(mnemonic, syntax, value)?;
        Ok(Commit {
            metadata,
            forward: false,
            mnemonic: mnemonic.to_string(),
            syntax,
        })
    }

    fn macro_call(&mut self, name: &str, args: &str, line: &ParsedLine, depth: usize) -> Vec<u8> {
        let position = self.position(line);
        let start = self.pc;

        let macros = self.macros;
        let context = MacroContext {
            origin: self.origin,
            current_address: self.pc as u16,
            labels: &self.symbols,
        };
        let expansion = macros.expand(name, args, &context, self.pass);

        let emitted = match expansion {
            Ok(MacroOutput::Empty) => Vec::new(),
            Ok(MacroOutput::Bytes(bytes)) => self.emit(bytes, line),
            Ok(MacroOutput::Source(text)) => self.expand_source(name, &text, line, depth),
            Err(err) => {
                self.error(
                    ErrorType::MacroExpansion,
                    line.line_number,
                    line.column,
                    err.to_string(),
                );
                Vec::new()
            }
        };

        let size = (self.pc - start) as usize;
        if self.pass == 1 {
            self.macro_sizes.insert(position, size);
        } else if let Some(&first_size) = self.macro_sizes.get(&position) {
            if first_size != size {
                self.error(
                    ErrorType::MacroExpansion,
                    line.line_number,
                    line.column,
                    format!(
                        "macro '{}' emitted {} bytes in pass 2 but {} in pass 1",
                        name, size, first_size
                    ),
                );
            }
        }

        emitted
    }

    /// Assembles macro output text in place; its lines report the invoking line.
    fn expand_source(&mut self, name: &str, text: &str, line: &ParsedLine, depth: usize) -> Vec<u8> {
        if depth >= self.config.max_macro_depth {
            self.error(
                ErrorType::MacroExpansion,
                line.line_number,
                line.column,
                format!(
                    "macro '{}' nests deeper than {} levels",
                    name, self.config.max_macro_depth
                ),
            );
            return Vec::new();
        }

        let mut emitted = Vec::new();
        for (index, source_line) in text.lines().enumerate() {
            self.expansion_path.push(index);
            match parse_line(source_line, line.line_number) {
                Ok(nested) => emitted.extend(self.process_line(&nested, depth + 1)),
                Err(err) => self.error(
                    ErrorType::MacroExpansion,
                    line.line_number,
                    line.column,
                    format!("in expansion of '{}': {}", name, err.message),
                ),
            }
            self.expansion_path.pop();
        }
        emitted
    }
}
