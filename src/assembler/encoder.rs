//! Instruction encoder for the 6502 assembler
//!
//! Turns a resolved table entry plus a final operand value into bytes. Every
//! operand is range-checked against its addressing mode here; nothing is
//! silently truncated except the documented two's-complement forms (negative
//! immediates and data bytes).

use crate::addressing::AddressingMode;
use crate::opcodes::OpcodeMetadata;
use crate::resolver::{branch_offset, ResolveError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("value {value} out of range for {what}")]
    ValueRange { value: i32, what: &'static str },

    #[error("{0}")]
    BranchRange(ResolveError),

    #[error("missing operand")]
    MissingOperand,
}

/// Encode an instruction placed at `address`.
///
/// `operand` is the evaluated operand expression; for branches it is the
/// target address.
///
/// # Examples
///
/// ```
/// use tool6502::assembler::encoder::encode_instruction;
/// use tool6502::lookup_by_opcode;
///
/// let sta_zp = lookup_by_opcode(0x85).unwrap();
/// assert_eq!(encode_instruction(sta_zp, Some(0x10), 0x0202), Ok(vec![0x85, 0x10]));
///
/// let bne = lookup_by_opcode(0xD0).unwrap();
/// assert_eq!(encode_instruction(bne, Some(0x0200), 0x0204), Ok(vec![0xD0, 0xFA]));
/// ```
pub fn encode_instruction(
    metadata: &OpcodeMetadata,
    operand: Option<i32>,
    address: u16,
) -> Result<Vec<u8>, EncodeError> {
    let mode = metadata.addressing_mode;
    let mut bytes = Vec::with_capacity(metadata.size_bytes as usize);
    bytes.push(metadata.opcode);

    if mode.operand_bytes() == 0 {
        return Ok(bytes);
    }

    let value = operand.ok_or(EncodeError::MissingOperand)?;
    match mode {
        AddressingMode::Relative => {
            let target = check(value, 0, 0xFFFF, "branch target")?;
            let offset = branch_offset(address, target as u16).map_err(EncodeError::BranchRange)?;
            bytes.push(offset as u8);
        }
        AddressingMode::Immediate => bytes.push(encode_byte(value)?),
        _ if mode.operand_bytes() == 1 => {
            bytes.push(check(value, 0, 0xFF, "zero page address")? as u8);
        }
        _ => {
            let word = check(value, 0, 0xFFFF, "address")? as u16;
            bytes.extend_from_slice(&word.to_le_bytes());
        }
    }

    Ok(bytes)
}

/// A data or immediate byte: -128..=255, negatives stored as two's complement.
pub fn encode_byte(value: i32) -> Result<u8, EncodeError> {
    check(value, -128, 0xFF, "byte").map(|v| v as u8)
}

/// A little-endian data word: -32768..=65535.
pub fn encode_word(value: i32) -> Result<[u8; 2], EncodeError> {
    check(value, -0x8000, 0xFFFF, "word").map(|v| (v as u16).to_le_bytes())
}

fn check(value: i32, min: i32, max: i32, what: &'static str) -> Result<i32, EncodeError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(EncodeError::ValueRange { value, what })
    }
}
