//! 6502 Disassembler Module
//!
//! Converts machine code back into assembly text. The decoder walks forward by
//! each decoded instruction's length, never by a fixed stride, and always emits
//! the canonical mnemonic and operand syntax.
//!
//! In reassemblable mode the text is guaranteed to assemble back to the same
//! bytes: absolute operands that fit in one byte carry the `.a` suffix, and
//! [`Disassembler::render_source`] emits the equates and `ORG` lines needed to
//! reproduce the image exactly.
//!
//! # Examples
//!
//! ```
//! use tool6502::disassembler::{Disassembler, DisassemblyOptions};
//! use tool6502::ObjectCode;
//!
//! let image = ObjectCode::from_bytes(0x0200, &[0xA9, 0x55, 0x85, 0x10, 0x00]);
//! let dis = Disassembler::new(&image, DisassemblyOptions::default());
//!
//! let lines: Vec<String> = dis.disassemble_region(0x0200, 5).map(|l| l.text).collect();
//! assert_eq!(lines, vec!["LDA #$55", "STA $10", "BRK"]);
//! ```

pub mod decoder;
pub mod formatter;

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::addressing::AddressingMode;
use crate::assembler::symbol_table::SymbolTable;
use crate::object_code::ObjectCode;
use formatter::{format_instruction, operand_symbol, FormatOptions};

/// A single disassembled instruction with full metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Memory address where this instruction starts
    pub address: u16,

    /// The opcode byte value (0x00-0xFF), or the data byte for `DB`
    pub opcode: u8,

    /// Instruction mnemonic (e.g., "LDA", "STA", "JMP"), or "DB"
    pub mnemonic: &'static str,

    /// Addressing mode used by this instruction
    pub addressing_mode: AddressingMode,

    /// Operand bytes (0-2 bytes depending on addressing mode)
    pub operand_bytes: Vec<u8>,

    /// Total size in bytes (1-3 bytes: opcode + operands)
    pub size_bytes: u8,

    /// Base cycle cost (excluding page-crossing penalties)
    pub base_cycles: u8,
}

/// Options controlling disassembly output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisassemblyOptions {
    /// Base address for the slice API ([`disassemble`])
    pub start_address: u16,

    /// Emit text that reassembles to identical bytes
    pub reassemblable: bool,

    /// Prefix listing lines with address and raw bytes
    pub show_bytes: bool,
}

/// One decoded line of a region.
#[derive(Debug, Clone, PartialEq)]
pub struct DisassembledLine {
    pub address: u16,
    pub text: String,
    /// Bytes consumed (1-3)
    pub length: u8,
    pub instruction: Instruction,
}

impl DisassembledLine {
    /// `ADDR  BYTES     TEXT` when `show_bytes`, otherwise just the text.
    pub fn render(&self, show_bytes: bool) -> String {
        if !show_bytes {
            return self.text.clone();
        }
        let bytes = self
            .instruction
            .bytes()
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ");
        format!("{:04X}  {:<8}  {}", self.address, bytes, self.text)
    }
}

/// Disassembler over a sparse object code image
#[derive(Debug, Clone, Copy)]
pub struct Disassembler<'a> {
    image: &'a ObjectCode,
    options: DisassemblyOptions,
    symbols: Option<&'a SymbolTable>,
}

impl<'a> Disassembler<'a> {
    pub fn new(image: &'a ObjectCode, options: DisassemblyOptions) -> Self {
        Self {
            image,
            options,
            symbols: None,
        }
    }

    /// Substitute names from `symbols` for matching address operands.
    pub fn with_symbols(mut self, symbols: &'a SymbolTable) -> Self {
        self.symbols = Some(symbols);
        self
    }

    fn format_options(&self) -> FormatOptions<'a> {
        FormatOptions {
            symbols: self.symbols,
            reassemblable: self.options.reassemblable,
        }
    }

    fn decode(&self, address: u16, end: u32) -> Option<DisassembledLine> {
        let instruction = decoder::decode_at(self.image, address, end)?;
        Some(DisassembledLine {
            address,
            text: format_instruction(&instruction, self.format_options()),
            length: instruction.size_bytes,
            instruction,
        })
    }

    /// Decode the instruction at `address`: its text and byte length.
    ///
    /// Returns `None` when `address` is a hole.
    pub fn disassemble_one(&self, address: u16) -> Option<(String, u8)> {
        self.decode(address, 0x10000).map(|line| (line.text, line.length))
    }

    /// Lazily decode `[start, start + length)`, skipping holes.
    ///
    /// The returned iterator is `Clone`; cloning it before iterating restarts
    /// the walk from the same position.
    pub fn disassemble_region(&self, start: u16, length: usize) -> Region<'a> {
        Region {
            disassembler: *self,
            next: start as u32,
            end: (start as u32 + length as u32).min(0x10000),
        }
    }

    /// Complete source text for a region: equates for every substituted
    /// symbol, an `ORG` at the start and after each hole, then one
    /// instruction per line.
    ///
    /// ```
    /// use tool6502::assembler::assemble;
    /// use tool6502::disassembler::{Disassembler, DisassemblyOptions};
    ///
    /// let original = assemble("ORG $0200\nSTA $0010.a\nJMP $0200").unwrap();
    /// let options = DisassemblyOptions { reassemblable: true, ..Default::default() };
    /// let source = Disassembler::new(&original.object_code, options).render_source(0x0200, 6);
    ///
    /// let again = assemble(&source).unwrap();
    /// assert_eq!(again.object_code, original.object_code);
    /// ```
    pub fn render_source(&self, start: u16, length: usize) -> String {
        let lines: Vec<DisassembledLine> = self.disassemble_region(start, length).collect();

        let mut equates = BTreeMap::new();
        if let Some(symbols) = self.symbols {
            for line in &lines {
                if let Some(name) = operand_symbol(&line.instruction, symbols) {
                    if let Some(symbol) = symbols.lookup_symbol(name) {
                        equates.insert(name, symbol.address);
                    }
                }
            }
        }

        let mut out = String::new();
        for (name, address) in &equates {
            let _ = writeln!(out, "{} = ${:04X}", name, address);
        }
        if !equates.is_empty() {
            out.push('\n');
        }

        let mut expected: Option<u32> = None;
        for line in &lines {
            if expected != Some(line.address as u32) {
                let _ = writeln!(out, "ORG ${:04X}", line.address);
            }
            let _ = writeln!(out, "    {}", line.text);
            expected = Some(line.address as u32 + line.length as u32);
        }

        out
    }
}

/// Lazy walk over a region; see [`Disassembler::disassemble_region`].
#[derive(Debug, Clone)]
pub struct Region<'a> {
    disassembler: Disassembler<'a>,
    next: u32,
    end: u32,
}

impl Iterator for Region<'_> {
    type Item = DisassembledLine;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.end {
            let address = self.next as u16;
            match self.disassembler.decode(address, self.end) {
                Some(line) => {
                    self.next += line.length as u32;
                    return Some(line);
                }
                None => self.next += 1,
            }
        }
        None
    }
}

/// Disassemble a byte slice into a vector of instructions
///
/// Bytes that do not start a complete documented instruction become `DB`
/// entries of one byte each.
pub fn disassemble(bytes: &[u8], options: DisassemblyOptions) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let mut pc = 0;
    let mut address = options.start_address;

    while pc < bytes.len() {
        let instr = decoder::decode_instruction(&bytes[pc..], address)
            .unwrap_or_else(|| Instruction::data_byte(address, bytes[pc]));
        pc += instr.size_bytes as usize;
        address = address.wrapping_add(instr.size_bytes as u16);
        instructions.push(instr);
    }

    instructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_disassemble_empty() {
        let instructions = disassemble(&[], DisassemblyOptions::default());
        assert_eq!(instructions.len(), 0);
    }

    #[test]
    fn test_disassemble_slice_with_illegal_byte() {
        let options = DisassemblyOptions {
            start_address: 0x8000,
            ..Default::default()
        };
        let instructions = disassemble(&[0xEA, 0x02, 0xAD, 0x00], options);
        let mnemonics: Vec<&str> = instructions.iter().map(|i| i.mnemonic).collect();
        assert_eq!(mnemonics, vec!["NOP", "DB", "DB", "BRK"]);
        assert_eq!(instructions[1].address, 0x8001);
    }

    #[test]
    fn test_disassemble_one() {
        let image = ObjectCode::from_bytes(0x1000, &[0x20, 0x00, 0x20]);
        let dis = Disassembler::new(&image, DisassemblyOptions::default());
        assert_eq!(dis.disassemble_one(0x1000), Some(("JSR $2000".to_string(), 3)));
        assert_eq!(dis.disassemble_one(0x0FFF), None);
    }

    #[test]
    fn test_region_is_lazy_and_restartable() {
        let image = ObjectCode::from_bytes(0x0200, &[0xEA; 10]);
        let dis = Disassembler::new(&image, DisassemblyOptions::default());
        let region = dis.disassemble_region(0x0200, 10);

        let first_two: Vec<u16> = region.clone().take(2).map(|l| l.address).collect();
        assert_eq!(first_two, vec![0x0200, 0x0201]);
        assert_eq!(region.count(), 10);
    }

    #[test]
    fn test_region_stops_at_end_and_skips_holes() {
        let mut image = ObjectCode::from_bytes(0x0200, &[0xA9, 0x01]);
        image.write(0x0210, 0x60).unwrap();
        let dis = Disassembler::new(&image, DisassemblyOptions::default());

        let lines: Vec<(u16, String)> = dis
            .disassemble_region(0x0200, 0x20)
            .map(|l| (l.address, l.text))
            .collect();
        assert_eq!(
            lines,
            vec![(0x0200, "LDA #$01".to_string()), (0x0210, "RTS".to_string())]
        );

        // region ends inside the operand
        let cut: Vec<String> = dis.disassemble_region(0x0200, 1).map(|l| l.text).collect();
        assert_eq!(cut, vec!["DB $A9"]);
    }

    #[test]
    fn test_render_source_with_symbols() {
        let original = assemble("ORG $0300\nloop: DEX\nBNE loop\nptr = $FB\nLDA (ptr),Y\nORG $0310\nRTS").unwrap();
        let options = DisassemblyOptions {
            reassemblable: true,
            ..Default::default()
        };
        let source = Disassembler::new(&original.object_code, options)
            .with_symbols(&original.symbols)
            .render_source(0x0300, 0x11);

        assert_eq!(
            source,
            "loop = $0300\nptr = $00FB\n\nORG $0300\n    DEX\n    BNE loop\n    LDA (ptr),Y\nORG $0310\n    RTS\n"
        );
        assert_eq!(assemble(&source).unwrap().object_code, original.object_code);
    }

    #[test]
    fn test_render_line_with_bytes() {
        let image = ObjectCode::from_bytes(0x0200, &[0xA9, 0x55]);
        let dis = Disassembler::new(&image, DisassemblyOptions::default());
        let line = dis.disassemble_region(0x0200, 2).next().unwrap();
        assert_eq!(line.render(true), "0200  A9 55     LDA #$55");
        assert_eq!(line.render(false), "LDA #$55");
    }
}
