//! Round-trip verification of assembled images.

use tool6502::assembler::assemble;
use tool6502::disassembler::{Disassembler, DisassemblyOptions};
use tool6502::verifier::{compare, Comparison, MismatchReport, Pattern};

fn mismatch(original: &[u8], candidate: &[u8], base: u16) -> MismatchReport {
    match compare(original, candidate, base) {
        Comparison::Mismatch(report) => report,
        Comparison::Identical => panic!("expected a mismatch"),
    }
}

#[test]
fn test_reassembled_program_is_identical() {
    let source = "ORG $C000\nreset: LDX #$FF\nTXS\nLDA $0002.a\nloop: JMP loop\nDB $02, $FF";
    let original = assemble(source).unwrap();
    let options = DisassemblyOptions {
        reassemblable: true,
        ..Default::default()
    };
    let text = Disassembler::new(&original.object_code, options)
        .render_source(0xC000, original.object_code.assigned_count());
    let again = assemble(&text).unwrap();

    assert!(compare(&original.bytes(), &again.bytes(), 0xC000).is_identical());
}

#[test]
fn test_lossy_disassembly_is_caught() {
    // plain text drops the forced-absolute marker, so LDA shrinks to zero page
    let original = assemble("ORG $C000\nLDA $0002.a\nRTS").unwrap();
    let text = Disassembler::new(&original.object_code, DisassemblyOptions::default())
        .render_source(0xC000, 4);
    let again = assemble(&text).unwrap();

    let report = mismatch(&original.bytes(), &again.bytes(), 0xC000);
    assert_eq!(report.length_difference, Some((4, 3)));
    assert_eq!(report.first_difference.unwrap().address, 0xC000);
    assert!(report
        .patterns
        .contains(&Pattern::InstructionSizeDelta { difference: -1 }));
}

#[test]
fn test_shifted_operand_shows_constant_offset() {
    let report = mismatch(&[0x4C, 0x10, 0x08], &[0x4C, 0x12, 0x0A], 0x0800);
    assert_eq!(report.differing_bytes, 2);
    assert_eq!(
        report.patterns,
        vec![Pattern::ConstantOffset {
            start: 0x0801,
            length: 2,
            delta: 0x02
        }]
    );
}

#[test]
fn test_endian_swap_in_word_table() {
    let report = mismatch(&[0x34, 0x12, 0x78, 0x56], &[0x12, 0x34, 0x78, 0x56], 0x2000);
    assert_eq!(report.patterns, vec![Pattern::EndianSwap { address: 0x2000 }]);
    assert_eq!(report.differing_bytes, 2);
}

#[test]
fn test_off_by_one_immediate() {
    let report = mismatch(&[0xA9, 0x10, 0x60], &[0xA9, 0x0F, 0x60], 0x0200);
    assert_eq!(report.patterns, vec![Pattern::OffByOne { address: 0x0201 }]);
}

#[test]
fn test_truncated_candidate() {
    let report = mismatch(&[0xEA; 10], &[0xEA; 4], 0x0300);
    assert_eq!(report.first_difference, None);
    assert_eq!(report.patterns, vec![Pattern::Truncated { missing: 6 }]);

    let text = report.to_string();
    assert!(text.contains("length: original 10 bytes, candidate 4 bytes"));
    assert!(text.contains("6 bytes missing"));
}

#[test]
fn test_full_image_with_scattered_differences() {
    let original = vec![0x40u8; 0x10000];
    let candidate: Vec<u8> = original
        .iter()
        .enumerate()
        .map(|(i, &byte)| if i % 2 == 0 { byte + 1 } else { byte })
        .collect();

    let report = mismatch(&original, &candidate, 0x0000);
    assert_eq!(report.differing_bytes, 0x8000);
    assert_eq!(report.patterns.len(), 0x8000);
    assert_eq!(report.patterns[1], Pattern::OffByOne { address: 0x0002 });
}
