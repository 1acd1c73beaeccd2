//! Instruction decoder for the 6502 disassembler

use crate::addressing::AddressingMode;
use crate::disassembler::Instruction;
use crate::object_code::ObjectCode;
use crate::opcodes::lookup_by_opcode;

/// Decode a single instruction from a byte slice
///
/// # Arguments
///
/// * `bytes` - The byte slice starting at the instruction to decode
/// * `address` - The memory address of this instruction
///
/// # Returns
///
/// Some(Instruction) if the opcode is documented and all of its operand
/// bytes are present, None otherwise
pub fn decode_instruction(bytes: &[u8], address: u16) -> Option<Instruction> {
    let (&opcode, rest) = bytes.split_first()?;
    let metadata = lookup_by_opcode(opcode)?;

    let operand_len = metadata.addressing_mode.operand_bytes() as usize;
    let operand_bytes = rest.get(..operand_len)?.to_vec();

    Some(Instruction {
        address,
        opcode,
        mnemonic: metadata.mnemonic,
        addressing_mode: metadata.addressing_mode,
        operand_bytes,
        size_bytes: metadata.size_bytes,
        base_cycles: metadata.base_cycles,
    })
}

/// Decode the instruction at `address` in a sparse image.
///
/// Operand bytes must be assigned and lie below `end` (exclusive); when they
/// don't, or the opcode has no table entry, the opcode byte alone becomes a
/// data byte. Returns `None` when `address` itself is a hole.
pub fn decode_at(image: &ObjectCode, address: u16, end: u32) -> Option<Instruction> {
    let opcode = image.get(address)?;

    let decoded = lookup_by_opcode(opcode).and_then(|metadata| {
        let size = metadata.size_bytes as u32;
        if address as u32 + size > end.min(0x10000) {
            return None;
        }
        let bytes = (0..size as u16)
            .map(|offset| image.get(address + offset))
            .collect::<Option<Vec<u8>>>()?;
        decode_instruction(&bytes, address)
    });

    Some(decoded.unwrap_or_else(|| Instruction::data_byte(address, opcode)))
}

impl Instruction {
    /// A byte emitted as `DB $xx`.
    pub fn data_byte(address: u16, value: u8) -> Self {
        Instruction {
            address,
            opcode: value,
            mnemonic: "DB",
            addressing_mode: AddressingMode::Implied,
            operand_bytes: Vec::new(),
            size_bytes: 1,
            base_cycles: 0,
        }
    }

    /// True for bytes that did not decode as an instruction.
    pub fn is_data(&self) -> bool {
        self.mnemonic == "DB"
    }

    /// Operand as a little-endian value (0 for implied forms).
    pub fn operand_value(&self) -> u16 {
        match self.operand_bytes.as_slice() {
            [low] => *low as u16,
            [low, high] => u16::from_le_bytes([*low, *high]),
            _ => 0,
        }
    }

    /// Every byte of the instruction, opcode first.
    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = vec![self.opcode];
        bytes.extend_from_slice(&self.operand_bytes);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_lda_immediate() {
        let bytes = &[0xA9, 0x42];
        let instr = decode_instruction(bytes, 0x8000).unwrap();

        assert_eq!(instr.address, 0x8000);
        assert_eq!(instr.opcode, 0xA9);
        assert_eq!(instr.mnemonic, "LDA");
        assert_eq!(instr.addressing_mode, AddressingMode::Immediate);
        assert_eq!(instr.operand_bytes, vec![0x42]);
        assert_eq!(instr.size_bytes, 2);
    }

    #[test]
    fn test_decode_sta_absolute() {
        let bytes = &[0x8D, 0x00, 0x80];
        let instr = decode_instruction(bytes, 0x0000).unwrap();

        assert_eq!(instr.mnemonic, "STA");
        assert_eq!(instr.addressing_mode, AddressingMode::Absolute);
        assert_eq!(instr.operand_value(), 0x8000);
        assert_eq!(instr.size_bytes, 3);
    }

    #[test]
    fn test_decode_truncated_and_illegal() {
        assert!(decode_instruction(&[0x8D, 0x00], 0).is_none());
        assert!(decode_instruction(&[0x02], 0).is_none());
        assert!(decode_instruction(&[], 0).is_none());
    }

    #[test]
    fn test_decode_at_hole_in_operand() {
        let mut image = ObjectCode::new();
        image.write(0x0200, 0xAD).unwrap(); // LDA abs, operand missing
        image.write(0x0202, 0x12).unwrap();

        let instr = decode_at(&image, 0x0200, 0x10000).unwrap();
        assert!(instr.is_data());
        assert_eq!(instr.opcode, 0xAD);
        assert!(decode_at(&image, 0x0201, 0x10000).is_none());
    }

    #[test]
    fn test_decode_at_respects_region_end() {
        let image = ObjectCode::from_bytes(0x0200, &[0xA9, 0x01]);
        assert!(!decode_at(&image, 0x0200, 0x0202).unwrap().is_data());
        assert!(decode_at(&image, 0x0200, 0x0201).unwrap().is_data());
    }
}
