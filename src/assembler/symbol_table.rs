//! Symbol table management for labels and equates

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::assembler::Symbol;

/// Malformed line in a symbol file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("symbol file line {line}: {message}")]
pub struct SymbolFileError {
    pub line: usize,
    pub message: String,
}

/// Symbol table keyed by name, iterated in name order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    symbols: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    /// Create a new empty symbol table
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a symbol
    ///
    /// Redefining a name with the value it already has is accepted. A different
    /// value returns the existing symbol as the error.
    pub fn define(&mut self, name: &str, address: u16, defined_at: usize) -> Result<(), Symbol> {
        if let Some(existing) = self.symbols.get(name) {
            if existing.address == address {
                return Ok(());
            }
            return Err(existing.clone());
        }

        self.symbols.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                address,
                defined_at,
            },
        );
        Ok(())
    }

    /// Look up a symbol by name
    pub fn lookup_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// All symbols, sorted by name
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// First symbol (by name) whose value is `address`.
    pub fn name_for(&self, address: u16) -> Option<&str> {
        self.symbols
            .values()
            .find(|s| s.address == address)
            .map(|s| s.name.as_str())
    }

    /// Renders one `NAME = $HHHH (DEC)` line per symbol, sorted by name.
    ///
    /// ```
    /// use tool6502::assembler::symbol_table::SymbolTable;
    ///
    /// let mut table = SymbolTable::new();
    /// table.define("start", 0x0200, 2).unwrap();
    /// assert_eq!(table.to_symbol_file(), format!("{:<20} = $0200 (512)\n", "start"));
    /// ```
    pub fn to_symbol_file(&self) -> String {
        let mut out = String::new();
        for symbol in self.symbols.values() {
            let _ = writeln!(
                out,
                "{:<20} = ${:04X} ({})",
                symbol.name, symbol.address, symbol.address
            );
        }
        out
    }

    /// Parses symbol file text.
    ///
    /// Blank lines and lines starting with `;` or `#` are skipped. Values may
    /// be `$hex`, `0xhex` or decimal; a trailing parenthesised note is ignored.
    pub fn parse_symbol_file(text: &str) -> Result<Self, SymbolFileError> {
        let mut table = Self::new();

        for (index, raw) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            let error = |message: String| SymbolFileError {
                line: line_number,
                message,
            };

            let (name, value) = line
                .split_once('=')
                .ok_or_else(|| error("expected NAME = VALUE".to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(error("missing symbol name".to_string()));
            }

            let value = value.split('(').next().unwrap_or("").trim();
            let parsed = if let Some(hex) = value.strip_prefix('$') {
                u16::from_str_radix(hex, 16)
            } else if let Some(hex) = value
                .strip_prefix("0x")
                .or_else(|| value.strip_prefix("0X"))
            {
                u16::from_str_radix(hex, 16)
            } else {
                value.parse::<u16>()
            };
            let address = parsed.map_err(|_| error(format!("invalid value '{}'", value)))?;

            table
                .define(name, address, line_number)
                .map_err(|existing| {
                    error(format!(
                        "'{}' redefined (was ${:04X})",
                        name, existing.address
                    ))
                })?;
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_table_define_lookup() {
        let mut table = SymbolTable::new();

        assert!(table.define("START", 0x8000, 1).is_ok());
        assert!(table.define("LOOP", 0x8010, 5).is_ok());

        let start = table.lookup_symbol("START").unwrap();
        assert_eq!(start.name, "START");
        assert_eq!(start.address, 0x8000);

        assert!(table.lookup_symbol("start").is_none());
        assert!(table.lookup_symbol("UNDEFINED").is_none());
    }

    #[test]
    fn test_symbol_table_redefinition() {
        let mut table = SymbolTable::new();

        assert!(table.define("START", 0x8000, 1).is_ok());
        assert!(table.define("START", 0x8000, 7).is_ok());
        let existing = table.define("START", 0x9000, 10).unwrap_err();
        assert_eq!(existing.defined_at, 1);

        // Original symbol should still be there
        assert_eq!(table.lookup_symbol("START").unwrap().address, 0x8000);
    }

    #[test]
    fn test_symbol_file_sorted_by_name() {
        let mut table = SymbolTable::new();
        table.define("zeta", 0x10, 1).unwrap();
        table.define("alpha", 0xC000, 2).unwrap();

        let text = table.to_symbol_file();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("alpha "));
        assert!(lines[0].ends_with("= $C000 (49152)"));
        assert!(lines[1].ends_with("= $0010 (16)"));
    }

    #[test]
    fn test_parse_symbol_file_formats() {
        let text = "# comment\nstart = $0200 (512)\nio=0xD000\ncount = 42\n\n";
        let table = SymbolTable::parse_symbol_file(text).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup_symbol("start").unwrap().address, 0x0200);
        assert_eq!(table.lookup_symbol("io").unwrap().address, 0xD000);
        assert_eq!(table.lookup_symbol("count").unwrap().address, 42);
        assert_eq!(table.name_for(0xD000), Some("io"));
    }

    #[test]
    fn test_parse_symbol_file_round_trip() {
        let mut table = SymbolTable::new();
        table.define("screen", 0x0400, 1).unwrap();
        table.define("zp_ptr", 0x00FB, 2).unwrap();
        let parsed = SymbolTable::parse_symbol_file(&table.to_symbol_file()).unwrap();
        assert_eq!(parsed.lookup_symbol("screen").unwrap().address, 0x0400);
        assert_eq!(parsed.lookup_symbol("zp_ptr").unwrap().address, 0x00FB);
    }

    #[test]
    fn test_parse_symbol_file_errors() {
        let err = SymbolTable::parse_symbol_file("ok = 1\nbroken line\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(SymbolTable::parse_symbol_file("x = $GG").is_err());
    }
}
