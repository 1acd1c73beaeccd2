//! Formatting functions for disassembled instructions
//!
//! Operands are always written in canonical upper-case syntax: `$HH` for
//! one-byte addresses, `$HHHH` for two-byte addresses and branch targets.

use crate::addressing::AddressingMode;
use crate::assembler::parser::validate_label;
use crate::assembler::symbol_table::SymbolTable;
use crate::disassembler::Instruction;
use crate::opcodes::lookup_by_opcode;
use crate::resolver::{branch_target, needs_force_absolute};

/// Options for [`format_instruction`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions<'a> {
    /// Names substituted for matching address operands
    pub symbols: Option<&'a SymbolTable>,
    /// Emit `.a` wherever re-encoding would otherwise pick zero page
    pub reassemblable: bool,
}

/// Format a single instruction as assembly text
///
/// ```
/// use tool6502::disassembler::decoder::decode_instruction;
/// use tool6502::disassembler::formatter::{format_instruction, FormatOptions};
///
/// let sta = decode_instruction(&[0x8D, 0x10, 0x00], 0x0200).unwrap();
/// assert_eq!(format_instruction(&sta, FormatOptions::default()), "STA $0010");
///
/// let exact = FormatOptions { reassemblable: true, ..FormatOptions::default() };
/// assert_eq!(format_instruction(&sta, exact), "STA $0010.a");
/// ```
pub fn format_instruction(instr: &Instruction, options: FormatOptions<'_>) -> String {
    let operand = format_operand(instr, options);

    if operand.is_empty() {
        instr.mnemonic.to_string()
    } else {
        format!("{} {}", instr.mnemonic, operand)
    }
}

/// Address an operand refers to, for modes that name an address.
pub fn operand_address(instr: &Instruction) -> Option<u16> {
    use AddressingMode::*;

    match instr.addressing_mode {
        _ if instr.is_data() => None,
        Implied | Accumulator | Immediate => None,
        Relative => Some(branch_target(instr.address, instr.operand_value() as u8 as i8)),
        _ => Some(instr.operand_value()),
    }
}

/// Symbol name that will replace this instruction's operand, if any.
pub fn operand_symbol<'s>(instr: &Instruction, symbols: &'s SymbolTable) -> Option<&'s str> {
    let address = operand_address(instr)?;
    symbols
        .symbols()
        .find(|s| s.address == address && validate_label(&s.name).is_ok())
        .map(|s| s.name.as_str())
}

/// Format the operand based on addressing mode
fn format_operand(instr: &Instruction, options: FormatOptions<'_>) -> String {
    use AddressingMode::*;

    if instr.is_data() {
        return format!("${:02X}", instr.opcode);
    }

    let value = instr.operand_value();
    let symbol = options.symbols.and_then(|table| operand_symbol(instr, table));
    let address = |width: usize| match symbol {
        Some(name) => name.to_string(),
        None if width == 2 => format!("${:02X}", value),
        None => format!("${:04X}", value),
    };

    match instr.addressing_mode {
        Implied => String::new(),
        Accumulator => "A".to_string(),
        Immediate => format!("#${:02X}", value),
        ZeroPage => address(2),
        ZeroPageX => format!("{},X", address(2)),
        ZeroPageY => format!("{},Y", address(2)),
        Relative => match symbol {
            Some(name) => name.to_string(),
            None => format!("${:04X}", operand_address(instr).unwrap_or(0)),
        },
        Absolute | AbsoluteX | AbsoluteY => {
            let mut text = address(4);
            let forced = options.reassemblable
                && lookup_by_opcode(instr.opcode)
                    .is_some_and(|metadata| needs_force_absolute(metadata, value));
            if forced {
                text.push_str(".a");
            }
            match instr.addressing_mode {
                AbsoluteX => text.push_str(",X"),
                AbsoluteY => text.push_str(",Y"),
                _ => {}
            }
            text
        }
        Indirect => format!("({})", address(4)),
        IndirectX => format!("({},X)", address(2)),
        IndirectY => format!("({}),Y", address(2)),
    }
}

/// Classic 16-bytes-per-row hex dump with an ASCII column.
///
/// ```
/// use tool6502::disassembler::formatter::hex_dump;
///
/// let dump = hex_dump(&[0x48, 0x69, 0x00], 0x0400);
/// assert!(dump.starts_with("0400: 48 69 00"));
/// assert!(dump.contains("|Hi.  "));
/// ```
pub fn hex_dump(bytes: &[u8], start: u16) -> String {
    let mut out = String::new();

    for (row, chunk) in bytes.chunks(16).enumerate() {
        let address = start.wrapping_add((row * 16) as u16);
        let cells: Vec<String> = (0..16)
            .map(|i| match chunk.get(i) {
                Some(byte) => format!("{:02X}", byte),
                None => "  ".to_string(),
            })
            .collect();
        let ascii: String = (0..16)
            .map(|i| match chunk.get(i) {
                Some(&byte) if (32..=126).contains(&byte) => byte as char,
                Some(_) => '.',
                None => ' ',
            })
            .collect();

        out.push_str(&format!(
            "{:04X}: {}  {} |{}|\n",
            address,
            cells[..8].join(" "),
            cells[8..].join(" "),
            ascii
        ));
    }

    out
}
