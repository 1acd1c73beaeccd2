//! Opcode table validation tests
//!
//! Verifies that the instruction table is complete and internally consistent.

use std::collections::HashSet;
use tool6502::opcodes::{canonical_entries, is_branch, is_known_mnemonic, supports_mode, ALIAS_TABLE};
use tool6502::{lookup_by_mnemonic, lookup_by_opcode, AddressingMode, OPCODE_TABLE};

#[test]
fn test_documented_opcode_count() {
    assert_eq!(OPCODE_TABLE.len(), 256);
    assert_eq!(OPCODE_TABLE.iter().flatten().count(), 151);
}

#[test]
fn test_size_matches_addressing_mode() {
    for metadata in canonical_entries() {
        assert_eq!(
            metadata.size_bytes,
            1 + metadata.addressing_mode.operand_bytes(),
            "opcode ${:02X} ({})",
            metadata.opcode,
            metadata.mnemonic
        );
        assert!(metadata.base_cycles >= 2, "opcode ${:02X}", metadata.opcode);
    }
}

#[test]
fn test_mnemonic_and_mode_pairs_are_unique() {
    let mut seen = HashSet::new();
    for metadata in canonical_entries() {
        assert!(
            seen.insert((metadata.mnemonic, metadata.addressing_mode)),
            "{} {:?} appears twice",
            metadata.mnemonic,
            metadata.addressing_mode
        );
    }
    assert_eq!(seen.len(), 151);
}

#[test]
fn test_lookup_directions_agree() {
    for metadata in canonical_entries() {
        let found = lookup_by_mnemonic(metadata.mnemonic, metadata.addressing_mode).unwrap();
        assert_eq!(found.opcode, metadata.opcode);
        assert_eq!(lookup_by_opcode(metadata.opcode), Some(metadata));
    }
}

#[test]
fn test_undocumented_opcodes_have_no_entry() {
    for opcode in [0x02, 0x03, 0x1A, 0x80, 0x9C, 0xAB, 0xFF] {
        assert!(lookup_by_opcode(opcode).is_none(), "${:02X}", opcode);
    }
}

#[test]
fn test_mnemonic_lookup_is_case_insensitive() {
    let lower = lookup_by_mnemonic("lda", AddressingMode::AbsoluteX).unwrap();
    let mixed = lookup_by_mnemonic("LdA", AddressingMode::AbsoluteX).unwrap();
    assert_eq!(lower.opcode, 0xBD);
    assert_eq!(mixed.opcode, 0xBD);
}

#[test]
fn test_aliases_resolve_to_canonical_entries() {
    for alias in &ALIAS_TABLE {
        let resolved = lookup_by_mnemonic(alias.mnemonic, alias.addressing_mode).unwrap();
        assert_eq!(resolved.opcode, alias.opcode);
        // the table entry itself keeps its canonical spelling
        assert!(lookup_by_opcode(alias.opcode).is_some());
    }
    assert_eq!(lookup_by_mnemonic("BLT", AddressingMode::Relative).unwrap().mnemonic, "BCC");
    assert_eq!(lookup_by_mnemonic("lsr", AddressingMode::Implied).unwrap().opcode, 0x4A);
}

#[test]
fn test_mode_queries() {
    assert!(is_known_mnemonic("bge"));
    assert!(!is_known_mnemonic("XYZ"));
    assert!(supports_mode("LDX", AddressingMode::ZeroPageY));
    assert!(!supports_mode("LDA", AddressingMode::ZeroPageY));
    assert!(!supports_mode("STA", AddressingMode::Immediate));
    assert!(is_branch("BVS"));
    assert!(is_branch("BLT"));
    assert!(!is_branch("JMP"));
}

#[test]
fn test_jmp_forms() {
    assert_eq!(lookup_by_opcode(0x4C).unwrap().addressing_mode, AddressingMode::Absolute);
    assert_eq!(lookup_by_opcode(0x6C).unwrap().addressing_mode, AddressingMode::Indirect);
    assert_eq!(lookup_by_opcode(0x6C).unwrap().base_cycles, 5);
}
