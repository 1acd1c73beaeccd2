//! Integration tests for the disassembler.
//!
//! Tests cover:
//! - Variable-length walking and canonical operand syntax
//! - Undocumented and truncated bytes emitted as data
//! - Symbol substitution and reassemblable output

use pretty_assertions::assert_eq;
use tool6502::assembler::assemble;
use tool6502::assembler::symbol_table::SymbolTable;
use tool6502::disassembler::{disassemble, Disassembler, DisassemblyOptions};
use tool6502::ObjectCode;

fn texts(bytes: &[u8], start: u16) -> Vec<String> {
    let image = ObjectCode::from_bytes(start, bytes);
    Disassembler::new(&image, DisassemblyOptions::default())
        .disassemble_region(start, bytes.len())
        .map(|line| line.text)
        .collect()
}

#[test]
fn test_walks_by_instruction_length() {
    // LDA #$01; STA $0200; INX; BNE back to $8000
    let bytes = [0xA9, 0x01, 0x8D, 0x00, 0x02, 0xE8, 0xD0, 0xF8];
    assert_eq!(
        texts(&bytes, 0x8000),
        vec!["LDA #$01", "STA $0200", "INX", "BNE $8000"]
    );
}

#[test]
fn test_branch_targets_are_absolute() {
    assert_eq!(texts(&[0xF0, 0x7F], 0x0200), vec!["BEQ $0281"]);
    assert_eq!(texts(&[0x30, 0x80], 0x0300), vec!["BMI $0282"]);
}

#[test]
fn test_undocumented_bytes_become_data() {
    assert_eq!(
        texts(&[0xEA, 0x02, 0xFF, 0x60], 0x1000),
        vec!["NOP", "DB $02", "DB $FF", "RTS"]
    );
}

#[test]
fn test_truncated_final_instruction() {
    // JMP whose high operand byte is past the region end
    assert_eq!(texts(&[0xEA, 0x4C, 0x00], 0x1000), vec!["NOP", "DB $4C", "BRK"]);
}

#[test]
fn test_slice_api_tracks_addresses() {
    let options = DisassemblyOptions {
        start_address: 0xC000,
        ..Default::default()
    };
    let instructions = disassemble(&[0x20, 0x00, 0xC0, 0x60], options);

    assert_eq!(instructions.len(), 2);
    assert_eq!(instructions[0].mnemonic, "JSR");
    assert_eq!(instructions[0].operand_value(), 0xC000);
    assert_eq!(instructions[1].address, 0xC003);
    assert_eq!(instructions[1].bytes(), vec![0x60]);
}

#[test]
fn test_disassemble_one_reports_length() {
    let image = ObjectCode::from_bytes(0x0400, &[0x6C, 0xFC, 0xFF]);
    let dis = Disassembler::new(&image, DisassemblyOptions::default());
    assert_eq!(dis.disassemble_one(0x0400), Some(("JMP ($FFFC)".to_string(), 3)));
    assert_eq!(dis.disassemble_one(0x0401), Some(("DB $FC".to_string(), 1)));
    assert_eq!(dis.disassemble_one(0x0403), None);
}

#[test]
fn test_plain_mode_loses_forced_absolute() {
    let image = ObjectCode::from_bytes(0x0200, &[0xAD, 0x10, 0x00]);
    let plain = Disassembler::new(&image, DisassemblyOptions::default());
    let exact = Disassembler::new(
        &image,
        DisassemblyOptions {
            reassemblable: true,
            ..Default::default()
        },
    );

    assert_eq!(plain.disassemble_one(0x0200).unwrap().0, "LDA $0010");
    assert_eq!(exact.disassemble_one(0x0200).unwrap().0, "LDA $0010.a");
    // without the suffix the assembler would pick zero page
    assert_eq!(assemble("ORG $0200\nLDA $0010").unwrap().bytes(), vec![0xA5, 0x10]);
}

#[test]
fn test_symbols_from_symbol_file() {
    let table = SymbolTable::parse_symbol_file(&format!(
        "{:<20} = $D020 (53280)\n{:<20} = $0200 (512)\n",
        "border", "start"
    ))
    .unwrap();
    let image = ObjectCode::from_bytes(0x0200, &[0xEE, 0x20, 0xD0, 0x4C, 0x00, 0x02]);
    let dis = Disassembler::new(&image, DisassemblyOptions::default()).with_symbols(&table);

    let lines: Vec<String> = dis.disassemble_region(0x0200, 6).map(|l| l.text).collect();
    assert_eq!(lines, vec!["INC border", "JMP start"]);
}

#[test]
fn test_render_source_reassembles_sparse_image() {
    let original = assemble("ORG $0200\nLDA #$FF\nSTA $0001.a\nORG $0280\nDB 2, 3\nRTS").unwrap();
    let options = DisassemblyOptions {
        reassemblable: true,
        ..Default::default()
    };
    let source = Disassembler::new(&original.object_code, options).render_source(0x0200, 0x84);

    assert_eq!(
        source,
        "ORG $0200\n    LDA #$FF\n    STA $0001.a\nORG $0280\n    DB $02\n    DB $03\n    RTS\n"
    );
    assert_eq!(assemble(&source).unwrap().object_code, original.object_code);
}

#[test]
fn test_region_at_top_of_memory() {
    let image = ObjectCode::from_bytes(0xFFFD, &[0xEA, 0x20, 0x00]);
    let lines: Vec<(u16, String)> = Disassembler::new(&image, DisassemblyOptions::default())
        .disassemble_region(0xFFFD, 3)
        .map(|l| (l.address, l.text))
        .collect();

    assert_eq!(
        lines,
        vec![
            (0xFFFD, "NOP".to_string()),
            (0xFFFE, "DB $20".to_string()),
            (0xFFFF, "BRK".to_string()),
        ]
    );
}

#[test]
fn test_branch_wrapping_past_top_of_memory_reassembles() {
    let original = assemble("ORG $FFF0\nDB $D0, $10").unwrap();
    let options = DisassemblyOptions {
        reassemblable: true,
        ..Default::default()
    };
    let source = Disassembler::new(&original.object_code, options).render_source(0xFFF0, 2);

    assert_eq!(source, "ORG $FFF0\n    BNE $0002\n");
    assert_eq!(assemble(&source).unwrap().object_code, original.object_code);
}
