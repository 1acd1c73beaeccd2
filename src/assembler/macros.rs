//! Macro expansion interface
//!
//! The assembler hands every `@name args` line to a [`MacroRegistry`]. Handlers
//! are registered by name before assembly starts and are called once per pass
//! with the arguments split on commas (outside quotes) and a read-only view of
//! the assembly state.

use std::collections::HashMap;
use std::fmt;

use super::symbol_table::SymbolTable;

/// What a handler can see of the assembly in progress.
#[derive(Debug, Clone, Copy)]
pub struct MacroContext<'a> {
    /// Most recent `ORG` value
    pub origin: u16,
    /// Address the expansion will be placed at
    pub current_address: u16,
    /// Symbols known so far; complete only in pass 2
    pub labels: &'a SymbolTable,
}

/// Result of expanding a macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroOutput {
    /// Raw bytes emitted at the current address
    Bytes(Vec<u8>),
    /// Assembly text assembled in place of the invocation
    Source(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MacroError {
    #[error("unknown macro '{0}'")]
    UnknownMacro(String),

    #[error("macro '{name}' failed: {message}")]
    Failed { name: String, message: String },
}

/// A macro implementation; `pass` is 1 or 2.
pub type MacroHandler =
    dyn Fn(&[String], &MacroContext<'_>, u8) -> Result<MacroOutput, String>;

/// Name to handler mapping.
///
/// # Examples
///
/// ```
/// use tool6502::assembler::macros::{MacroContext, MacroOutput, MacroRegistry};
/// use tool6502::assembler::symbol_table::SymbolTable;
///
/// let mut registry = MacroRegistry::new();
/// registry.register("twice", |args, _context, _pass| {
///     let byte: u8 = args[0].parse().map_err(|_| "not a byte".to_string())?;
///     Ok(MacroOutput::Bytes(vec![byte, byte]))
/// });
///
/// let labels = SymbolTable::new();
/// let context = MacroContext { origin: 0, current_address: 0, labels: &labels };
/// assert_eq!(
///     registry.expand("twice", "7", &context, 1),
///     Ok(MacroOutput::Bytes(vec![7, 7]))
/// );
/// ```
#[derive(Default)]
pub struct MacroRegistry {
    handlers: HashMap<String, Box<MacroHandler>>,
}

impl MacroRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in data macros.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        super::builtin_macros::register_all(&mut registry);
        registry
    }

    /// Registers `handler` under `name`, replacing any previous handler.
    pub fn register<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&[String], &MacroContext<'_>, u8) -> Result<MacroOutput, String> + 'static,
    {
        self.handlers.insert(name.to_string(), Box::new(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Expands `name` with raw argument text.
    pub fn expand(
        &self,
        name: &str,
        args: &str,
        context: &MacroContext<'_>,
        pass: u8,
    ) -> Result<MacroOutput, MacroError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| MacroError::UnknownMacro(name.to_string()))?;

        handler(&split_args(args), context, pass)
            .map_err(|message| MacroError::Failed {
                name: name.to_string(),
                message,
            })
    }
}

impl fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

/// Splits macro arguments on commas outside single or double quotes.
///
/// ```
/// use tool6502::assembler::macros::split_args;
///
/// assert_eq!(split_args(r#""a, b", 3"#), vec![r#""a, b""#, "3"]);
/// assert!(split_args("  ").is_empty());
/// ```
pub fn split_args(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in text.chars() {
        if escaped {
            escaped = false;
        } else if ch == '\\' && quote.is_some() {
            escaped = true;
        } else if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
        } else if ch == '"' || ch == '\'' {
            quote = Some(ch);
        } else if ch == ',' {
            args.push(current.trim().to_string());
            current.clear();
            continue;
        }
        current.push(ch);
    }
    args.push(current.trim().to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(labels: &SymbolTable) -> MacroContext<'_> {
        MacroContext {
            origin: 0x0200,
            current_address: 0x0210,
            labels,
        }
    }

    #[test]
    fn test_unknown_macro() {
        let registry = MacroRegistry::new();
        let labels = SymbolTable::new();
        assert_eq!(
            registry.expand("nope", "", &context(&labels), 1),
            Err(MacroError::UnknownMacro("nope".to_string()))
        );
    }

    #[test]
    fn test_handler_sees_context_and_pass() {
        let mut registry = MacroRegistry::new();
        registry.register("here", |_, ctx, pass| {
            Ok(MacroOutput::Bytes(vec![ctx.current_address as u8, pass]))
        });
        let labels = SymbolTable::new();
        assert_eq!(
            registry.expand("here", "", &context(&labels), 2),
            Ok(MacroOutput::Bytes(vec![0x10, 2]))
        );
    }

    #[test]
    fn test_handler_failure_is_wrapped() {
        let mut registry = MacroRegistry::new();
        registry.register("fail", |_, _, _| {
            Err("bad input".to_string())
        });
        let labels = SymbolTable::new();
        let err = registry.expand("fail", "", &context(&labels), 1).unwrap_err();
        assert_eq!(err.to_string(), "macro 'fail' failed: bad input");
    }

    #[test]
    fn test_split_args_quotes_and_escapes() {
        assert_eq!(split_args("1,2 , 3"), vec!["1", "2", "3"]);
        assert_eq!(split_args(r#""say \"hi, there\"", x"#).len(), 2);
        assert_eq!(split_args("',', 1"), vec!["','", "1"]);
    }

    #[test]
    fn test_builtins_registered() {
        let registry = MacroRegistry::with_builtins();
        for name in [
            "text_string",
            "pascal_string",
            "byte_table",
            "word_table",
            "jump_table",
            "repeat_byte",
            "raw_hex",
            "sine_table",
            "cosine_table",
        ] {
            assert!(registry.contains(name), "missing {}", name);
        }
    }
}
