//! # Addressing Modes
//!
//! This module defines the 13 addressing modes supported by the 6502 processor.
//! Each mode determines how the operand bytes following an opcode are encoded,
//! how the disassembler renders them, and how the simulator turns them into an
//! effective address.

/// 6502 addressing mode enumeration.
///
/// # Operand Sizes
///
/// - **0 bytes**: Implied, Accumulator
/// - **1 byte**: Immediate, ZeroPage, ZeroPageX, ZeroPageY, Relative, IndirectX, IndirectY
/// - **2 bytes**: Absolute, AbsoluteX, AbsoluteY, Indirect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// No operand, operation implied by instruction.
    ///
    /// Examples: CLC, RTS, NOP
    Implied,

    /// Operates directly on the accumulator register.
    ///
    /// Examples: LSR A, ROL A, ASL A
    Accumulator,

    /// 8-bit constant operand in instruction.
    ///
    /// Example: LDA #$10
    Immediate,

    /// 8-bit address in zero page (0x00-0xFF).
    ///
    /// Example: LDA $80
    ZeroPage,

    /// Zero page address indexed by X register, wrapping within zero page.
    ///
    /// Example: LDA $80,X
    ZeroPageX,

    /// Zero page address indexed by Y register, wrapping within zero page.
    ///
    /// Example: LDX $80,Y
    ZeroPageY,

    /// Full 16-bit address.
    ///
    /// Example: JMP $1234
    Absolute,

    /// 16-bit address indexed by X register.
    ///
    /// Example: LDA $1234,X
    AbsoluteX,

    /// 16-bit address indexed by Y register.
    ///
    /// Example: LDA $1234,Y
    AbsoluteY,

    /// Indirect jump through 16-bit pointer.
    ///
    /// Example: JMP ($FFFC)
    /// Only used by JMP instruction.
    Indirect,

    /// Indexed indirect: (ZP + X) then dereference.
    ///
    /// Example: LDA ($40,X)
    IndirectX,

    /// Indirect indexed: ZP dereference then + Y.
    ///
    /// Example: LDA ($40),Y
    IndirectY,

    /// Signed 8-bit offset for branch instructions.
    ///
    /// Example: BEQ label (offset is relative to the address after the branch)
    Relative,
}

impl AddressingMode {
    /// Number of operand bytes that follow the opcode.
    pub const fn operand_bytes(self) -> u8 {
        use AddressingMode::*;
        match self {
            Implied | Accumulator => 0,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY | Relative => 1,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 2,
        }
    }

    /// Total encoded instruction size (opcode plus operands).
    pub const fn instruction_size(self) -> u8 {
        1 + self.operand_bytes()
    }

    /// The zero-page counterpart of an absolute mode, if one exists.
    ///
    /// This is the pairing the zero-page collapse rule works over.
    pub const fn zero_page_form(self) -> Option<AddressingMode> {
        match self {
            AddressingMode::Absolute => Some(AddressingMode::ZeroPage),
            AddressingMode::AbsoluteX => Some(AddressingMode::ZeroPageX),
            AddressingMode::AbsoluteY => Some(AddressingMode::ZeroPageY),
            _ => None,
        }
    }

    /// The absolute counterpart of a zero-page mode, if one exists.
    pub const fn absolute_form(self) -> Option<AddressingMode> {
        match self {
            AddressingMode::ZeroPage => Some(AddressingMode::Absolute),
            AddressingMode::ZeroPageX => Some(AddressingMode::AbsoluteX),
            AddressingMode::ZeroPageY => Some(AddressingMode::AbsoluteY),
            _ => None,
        }
    }
}
