//! # Instruction Table
//!
//! The single source of truth for 6502 instruction encodings, shared by the
//! assembler, the disassembler and the simulator.
//!
//! The table covers the **151 documented NMOS 6502 opcodes**. Undocumented
//! opcodes have no entry at all: a lookup returns `None` rather than a
//! placeholder record, so no caller can mistake a sentinel for a real encoding.
//!
//! A secondary alias table lists extra spellings the assembler accepts. It is
//! many-to-one onto opcodes and is never consulted by the disassembler, which
//! always emits the canonical mnemonic.

use crate::addressing::AddressingMode;

/// The operation an opcode performs, independent of addressing mode.
///
/// The simulator dispatches on this rather than on the mnemonic text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
}

impl Operation {
    /// Canonical upper-case mnemonic
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Adc => "ADC",
            Operation::And => "AND",
            Operation::Asl => "ASL",
            Operation::Bcc => "BCC",
            Operation::Bcs => "BCS",
            Operation::Beq => "BEQ",
            Operation::Bit => "BIT",
            Operation::Bmi => "BMI",
            Operation::Bne => "BNE",
            Operation::Bpl => "BPL",
            Operation::Brk => "BRK",
            Operation::Bvc => "BVC",
            Operation::Bvs => "BVS",
            Operation::Clc => "CLC",
            Operation::Cld => "CLD",
            Operation::Cli => "CLI",
            Operation::Clv => "CLV",
            Operation::Cmp => "CMP",
            Operation::Cpx => "CPX",
            Operation::Cpy => "CPY",
            Operation::Dec => "DEC",
            Operation::Dex => "DEX",
            Operation::Dey => "DEY",
            Operation::Eor => "EOR",
            Operation::Inc => "INC",
            Operation::Inx => "INX",
            Operation::Iny => "INY",
            Operation::Jmp => "JMP",
            Operation::Jsr => "JSR",
            Operation::Lda => "LDA",
            Operation::Ldx => "LDX",
            Operation::Ldy => "LDY",
            Operation::Lsr => "LSR",
            Operation::Nop => "NOP",
            Operation::Ora => "ORA",
            Operation::Pha => "PHA",
            Operation::Php => "PHP",
            Operation::Pla => "PLA",
            Operation::Plp => "PLP",
            Operation::Rol => "ROL",
            Operation::Ror => "ROR",
            Operation::Rti => "RTI",
            Operation::Rts => "RTS",
            Operation::Sbc => "SBC",
            Operation::Sec => "SEC",
            Operation::Sed => "SED",
            Operation::Sei => "SEI",
            Operation::Sta => "STA",
            Operation::Stx => "STX",
            Operation::Sty => "STY",
            Operation::Tax => "TAX",
            Operation::Tay => "TAY",
            Operation::Tsx => "TSX",
            Operation::Txa => "TXA",
            Operation::Txs => "TXS",
            Operation::Tya => "TYA",
        }
    }
}

/// Metadata for a single 6502 opcode.
///
/// # Examples
///
/// ```
/// use tool6502::{lookup_by_opcode, AddressingMode};
///
/// let lda_imm = lookup_by_opcode(0xA9).unwrap();
/// assert_eq!(lda_imm.mnemonic, "LDA");
/// assert_eq!(lda_imm.addressing_mode, AddressingMode::Immediate);
/// assert_eq!(lda_imm.size_bytes, 2);
///
/// // Undocumented opcodes have no entry
/// assert!(lookup_by_opcode(0x02).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeMetadata {
    /// Opcode byte; the unique key of the canonical table.
    pub opcode: u8,

    /// Canonical instruction mnemonic (e.g., "LDA").
    pub mnemonic: &'static str,

    pub operation: Operation,

    /// Addressing mode for this instruction.
    pub addressing_mode: AddressingMode,

    /// Base cycle cost (before page crossing penalties).
    ///
    /// Informational only: the simulator counts it but does not model timing.
    pub base_cycles: u8,

    /// Total instruction size in bytes (opcode + operands).
    pub size_bytes: u8,
}

/// An alternate spelling accepted by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasEntry {
    /// Accepted mnemonic spelling
    pub mnemonic: &'static str,

    /// Operand shape this alias is written with
    pub addressing_mode: AddressingMode,

    /// Canonical opcode the alias encodes to
    pub opcode: u8,
}

const fn entry(
    opcode: u8,
    operation: Operation,
    addressing_mode: AddressingMode,
    base_cycles: u8,
) -> OpcodeMetadata {
    OpcodeMetadata {
        opcode,
        mnemonic: operation.as_str(),
        operation,
        addressing_mode,
        base_cycles,
        size_bytes: addressing_mode.instruction_size(),
    }
}

use AddressingMode::*;
use Operation::*;

const DOCUMENTED: [OpcodeMetadata; 151] = [
    entry(0x00, Brk, Implied, 7),
    entry(0x01, Ora, IndirectX, 6),
    entry(0x05, Ora, ZeroPage, 3),
    entry(0x06, Asl, ZeroPage, 5),
    entry(0x08, Php, Implied, 3),
    entry(0x09, Ora, Immediate, 2),
    entry(0x0A, Asl, Accumulator, 2),
    entry(0x0D, Ora, Absolute, 4),
    entry(0x0E, Asl, Absolute, 6),
    entry(0x10, Bpl, Relative, 2),
    entry(0x11, Ora, IndirectY, 5),
    entry(0x15, Ora, ZeroPageX, 4),
    entry(0x16, Asl, ZeroPageX, 6),
    entry(0x18, Clc, Implied, 2),
    entry(0x19, Ora, AbsoluteY, 4),
    entry(0x1D, Ora, AbsoluteX, 4),
    entry(0x1E, Asl, AbsoluteX, 7),
    entry(0x20, Jsr, Absolute, 6),
    entry(0x21, And, IndirectX, 6),
    entry(0x24, Bit, ZeroPage, 3),
    entry(0x25, And, ZeroPage, 3),
    entry(0x26, Rol, ZeroPage, 5),
    entry(0x28, Plp, Implied, 4),
    entry(0x29, And, Immediate, 2),
    entry(0x2A, Rol, Accumulator, 2),
    entry(0x2C, Bit, Absolute, 4),
    entry(0x2D, And, Absolute, 4),
    entry(0x2E, Rol, Absolute, 6),
    entry(0x30, Bmi, Relative, 2),
    entry(0x31, And, IndirectY, 5),
    entry(0x35, And, ZeroPageX, 4),
    entry(0x36, Rol, ZeroPageX, 6),
    entry(0x38, Sec, Implied, 2),
    entry(0x39, And, AbsoluteY, 4),
    entry(0x3D, And, AbsoluteX, 4),
    entry(0x3E, Rol, AbsoluteX, 7),
    entry(0x40, Rti, Implied, 6),
    entry(0x41, Eor, IndirectX, 6),
    entry(0x45, Eor, ZeroPage, 3),
    entry(0x46, Lsr, ZeroPage, 5),
    entry(0x48, Pha, Implied, 3),
    entry(0x49, Eor, Immediate, 2),
    entry(0x4A, Lsr, Accumulator, 2),
    entry(0x4C, Jmp, Absolute, 3),
    entry(0x4D, Eor, Absolute, 4),
    entry(0x4E, Lsr, Absolute, 6),
    entry(0x50, Bvc, Relative, 2),
    entry(0x51, Eor, IndirectY, 5),
    entry(0x55, Eor, ZeroPageX, 4),
    entry(0x56, Lsr, ZeroPageX, 6),
    entry(0x58, Cli, Implied, 2),
    entry(0x59, Eor, AbsoluteY, 4),
    entry(0x5D, Eor, AbsoluteX, 4),
    entry(0x5E, Lsr, AbsoluteX, 7),
    entry(0x60, Rts, Implied, 6),
    entry(0x61, Adc, IndirectX, 6),
    entry(0x65, Adc, ZeroPage, 3),
    entry(0x66, Ror, ZeroPage, 5),
    entry(0x68, Pla, Implied, 4),
    entry(0x69, Adc, Immediate, 2),
    entry(0x6A, Ror, Accumulator, 2),
    entry(0x6C, Jmp, Indirect, 5),
    entry(0x6D, Adc, Absolute, 4),
    entry(0x6E, Ror, Absolute, 6),
    entry(0x70, Bvs, Relative, 2),
    entry(0x71, Adc, IndirectY, 5),
    entry(0x75, Adc, ZeroPageX, 4),
    entry(0x76, Ror, ZeroPageX, 6),
    entry(0x78, Sei, Implied, 2),
    entry(0x79, Adc, AbsoluteY, 4),
    entry(0x7D, Adc, AbsoluteX, 4),
    entry(0x7E, Ror, AbsoluteX, 7),
    entry(0x81, Sta, IndirectX, 6),
    entry(0x84, Sty, ZeroPage, 3),
    entry(0x85, Sta, ZeroPage, 3),
    entry(0x86, Stx, ZeroPage, 3),
    entry(0x88, Dey, Implied, 2),
    entry(0x8A, Txa, Implied, 2),
    entry(0x8C, Sty, Absolute, 4),
    entry(0x8D, Sta, Absolute, 4),
    entry(0x8E, Stx, Absolute, 4),
    entry(0x90, Bcc, Relative, 2),
    entry(0x91, Sta, IndirectY, 6),
    entry(0x94, Sty, ZeroPageX, 4),
    entry(0x95, Sta, ZeroPageX, 4),
    entry(0x96, Stx, ZeroPageY, 4),
    entry(0x98, Tya, Implied, 2),
    entry(0x99, Sta, AbsoluteY, 5),
    entry(0x9A, Txs, Implied, 2),
    entry(0x9D, Sta, AbsoluteX, 5),
    entry(0xA0, Ldy, Immediate, 2),
    entry(0xA1, Lda, IndirectX, 6),
    entry(0xA2, Ldx, Immediate, 2),
    entry(0xA4, Ldy, ZeroPage, 3),
    entry(0xA5, Lda, ZeroPage, 3),
    entry(0xA6, Ldx, ZeroPage, 3),
    entry(0xA8, Tay, Implied, 2),
    entry(0xA9, Lda, Immediate, 2),
    entry(0xAA, Tax, Implied, 2),
    entry(0xAC, Ldy, Absolute, 4),
    entry(0xAD, Lda, Absolute, 4),
    entry(0xAE, Ldx, Absolute, 4),
    entry(0xB0, Bcs, Relative, 2),
    entry(0xB1, Lda, IndirectY, 5),
    entry(0xB4, Ldy, ZeroPageX, 4),
    entry(0xB5, Lda, ZeroPageX, 4),
    entry(0xB6, Ldx, ZeroPageY, 4),
    entry(0xB8, Clv, Implied, 2),
    entry(0xB9, Lda, AbsoluteY, 4),
    entry(0xBA, Tsx, Implied, 2),
    entry(0xBC, Ldy, AbsoluteX, 4),
    entry(0xBD, Lda, AbsoluteX, 4),
    entry(0xBE, Ldx, AbsoluteY, 4),
    entry(0xC0, Cpy, Immediate, 2),
    entry(0xC1, Cmp, IndirectX, 6),
    entry(0xC4, Cpy, ZeroPage, 3),
    entry(0xC5, Cmp, ZeroPage, 3),
    entry(0xC6, Dec, ZeroPage, 5),
    entry(0xC8, Iny, Implied, 2),
    entry(0xC9, Cmp, Immediate, 2),
    entry(0xCA, Dex, Implied, 2),
    entry(0xCC, Cpy, Absolute, 4),
    entry(0xCD, Cmp, Absolute, 4),
    entry(0xCE, Dec, Absolute, 6),
    entry(0xD0, Bne, Relative, 2),
    entry(0xD1, Cmp, IndirectY, 5),
    entry(0xD5, Cmp, ZeroPageX, 4),
    entry(0xD6, Dec, ZeroPageX, 6),
    entry(0xD8, Cld, Implied, 2),
    entry(0xD9, Cmp, AbsoluteY, 4),
    entry(0xDD, Cmp, AbsoluteX, 4),
    entry(0xDE, Dec, AbsoluteX, 7),
    entry(0xE0, Cpx, Immediate, 2),
    entry(0xE1, Sbc, IndirectX, 6),
    entry(0xE4, Cpx, ZeroPage, 3),
    entry(0xE5, Sbc, ZeroPage, 3),
    entry(0xE6, Inc, ZeroPage, 5),
    entry(0xE8, Inx, Implied, 2),
    entry(0xE9, Sbc, Immediate, 2),
    entry(0xEA, Nop, Implied, 2),
    entry(0xEC, Cpx, Absolute, 4),
    entry(0xED, Sbc, Absolute, 4),
    entry(0xEE, Inc, Absolute, 6),
    entry(0xF0, Beq, Relative, 2),
    entry(0xF1, Sbc, IndirectY, 5),
    entry(0xF5, Sbc, ZeroPageX, 4),
    entry(0xF6, Inc, ZeroPageX, 6),
    entry(0xF8, Sed, Implied, 2),
    entry(0xF9, Sbc, AbsoluteY, 4),
    entry(0xFD, Sbc, AbsoluteX, 4),
    entry(0xFE, Inc, AbsoluteX, 7),
];

const fn build_table() -> [Option<OpcodeMetadata>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < DOCUMENTED.len() {
        let metadata = DOCUMENTED[i];
        table[metadata.opcode as usize] = Some(metadata);
        i += 1;
    }
    table
}

/// Complete 256-slot opcode table indexed by opcode byte value.
pub static OPCODE_TABLE: [Option<OpcodeMetadata>; 256] = build_table();

/// Alternate spellings accepted by the assembler only.
///
/// `ASL`/`LSR`/`ROL`/`ROR` written without an operand mean the accumulator form;
/// `BLT`/`BGE` are the unsigned-compare names for `BCC`/`BCS`.
pub static ALIAS_TABLE: [AliasEntry; 6] = [
    AliasEntry { mnemonic: "ASL", addressing_mode: Implied, opcode: 0x0A },
    AliasEntry { mnemonic: "ROL", addressing_mode: Implied, opcode: 0x2A },
    AliasEntry { mnemonic: "LSR", addressing_mode: Implied, opcode: 0x4A },
    AliasEntry { mnemonic: "ROR", addressing_mode: Implied, opcode: 0x6A },
    AliasEntry { mnemonic: "BLT", addressing_mode: Relative, opcode: 0x90 },
    AliasEntry { mnemonic: "BGE", addressing_mode: Relative, opcode: 0xB0 },
];

/// Look up the canonical encoding for an opcode byte (decode direction).
pub fn lookup_by_opcode(opcode: u8) -> Option<&'static OpcodeMetadata> {
    OPCODE_TABLE[opcode as usize].as_ref()
}

/// Look up the encoding for a mnemonic written with a given addressing mode
/// (encode direction). Mnemonics are matched case-insensitively; aliases are
/// resolved onto their canonical opcode.
///
/// # Examples
///
/// ```
/// use tool6502::{lookup_by_mnemonic, AddressingMode};
///
/// assert_eq!(lookup_by_mnemonic("sta", AddressingMode::ZeroPage).unwrap().opcode, 0x85);
/// assert_eq!(lookup_by_mnemonic("ASL", AddressingMode::Implied).unwrap().opcode, 0x0A);
/// assert!(lookup_by_mnemonic("STA", AddressingMode::Immediate).is_none());
/// ```
pub fn lookup_by_mnemonic(mnemonic: &str, mode: AddressingMode) -> Option<&'static OpcodeMetadata> {
    canonical_entries()
        .find(|m| m.addressing_mode == mode && m.mnemonic.eq_ignore_ascii_case(mnemonic))
        .or_else(|| {
            ALIAS_TABLE
                .iter()
                .find(|a| a.addressing_mode == mode && a.mnemonic.eq_ignore_ascii_case(mnemonic))
                .and_then(|a| lookup_by_opcode(a.opcode))
        })
}

/// Whether the mnemonic (canonical or alias) is known at all.
pub fn is_known_mnemonic(mnemonic: &str) -> bool {
    canonical_entries().any(|m| m.mnemonic.eq_ignore_ascii_case(mnemonic))
        || ALIAS_TABLE
            .iter()
            .any(|a| a.mnemonic.eq_ignore_ascii_case(mnemonic))
}

/// Whether the mnemonic exists in the given addressing mode.
pub fn supports_mode(mnemonic: &str, mode: AddressingMode) -> bool {
    lookup_by_mnemonic(mnemonic, mode).is_some()
}

/// Whether the mnemonic is a relative branch.
pub fn is_branch(mnemonic: &str) -> bool {
    supports_mode(mnemonic, Relative)
}

/// Iterate over every documented opcode in ascending opcode order.
pub fn canonical_entries() -> impl Iterator<Item = &'static OpcodeMetadata> {
    OPCODE_TABLE.iter().flatten()
}
