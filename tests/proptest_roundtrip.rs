//! Property-based round-trip tests for assembler/disassembler.
//!
//! These tests verify that:
//! - assemble(disassemble(B, reassemblable)) == B for arbitrary instruction streams
//! - the same holds for images produced by assembling generated source
//! - arbitrary bytes (including undocumented opcodes) survive the round trip as data
//! - programs with labels and equates round-trip when the symbol table is
//!   passed back to the disassembler

use proptest::prelude::*;
use tool6502::assembler::assemble;
use tool6502::assembler::symbol_table::SymbolTable;
use tool6502::disassembler::{Disassembler, DisassemblyOptions};
use tool6502::opcodes::canonical_entries;
use tool6502::{AddressingMode, ObjectCode, OpcodeMetadata};

const BASE: u16 = 0x0400;

fn documented() -> Vec<&'static OpcodeMetadata> {
    canonical_entries().collect()
}

fn reassemble(image: &ObjectCode, start: u16, length: usize) -> ObjectCode {
    reassemble_with(image, None, start, length)
}

fn reassemble_with(
    image: &ObjectCode,
    symbols: Option<&SymbolTable>,
    start: u16,
    length: usize,
) -> ObjectCode {
    let options = DisassemblyOptions {
        reassemblable: true,
        ..Default::default()
    };
    let mut disassembler = Disassembler::new(image, options);
    if let Some(symbols) = symbols {
        disassembler = disassembler.with_symbols(symbols);
    }
    let source = disassembler.render_source(start, length);
    match assemble(&source) {
        Ok(output) => output.object_code,
        Err(errors) => panic!("reassembly failed: {:?}\n{}", errors, source),
    }
}

/// One encoded instruction: opcode plus operand bytes
fn instruction() -> impl Strategy<Value = Vec<u8>> {
    (prop::sample::select(documented()), any::<u16>()).prop_map(|(metadata, operand)| {
        let mut bytes = vec![metadata.opcode];
        let [low, high] = operand.to_le_bytes();
        match metadata.size_bytes {
            2 => bytes.push(low),
            3 => bytes.extend_from_slice(&[low, high]),
            _ => {}
        }
        bytes
    })
}

/// Source text for one instruction with a literal operand
fn source_line(metadata: &OpcodeMetadata, operand: u16) -> String {
    use AddressingMode::*;

    let byte = operand as u8;
    let text = match metadata.addressing_mode {
        Implied => String::new(),
        Accumulator => "A".to_string(),
        Immediate => format!("#${:02X}", byte),
        ZeroPage => format!("${:02X}", byte),
        ZeroPageX => format!("${:02X},X", byte),
        ZeroPageY => format!("${:02X},Y", byte),
        Absolute => format!("${:04X}", operand),
        AbsoluteX => format!("${:04X},X", operand),
        AbsoluteY => format!("${:04X},Y", operand),
        Indirect => format!("(${:04X})", operand),
        IndirectX => format!("(${:02X},X)", byte),
        IndirectY => format!("(${:02X}),Y", byte),
        // `*` is the branch's own address; offsets stay within range
        Relative => match (byte % 100) as i32 - 48 {
            offset if offset < 0 => format!("*-{}", -offset),
            offset => format!("*+{}", offset),
        },
    };
    format!("    {} {}", metadata.mnemonic, text)
}

/// A labelled program over zero-page and absolute equates. Every line
/// carries a label so branches and calls can target any of them.
fn symbolic_program() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(any::<u8>(), 1..4),
        prop::collection::vec(any::<u16>(), 1..4),
        prop::collection::vec((0u8..6, any::<usize>()), 1..24),
    )
        .prop_map(|(zero_page, absolute, lines)| {
            let mut source = String::new();
            for (i, value) in zero_page.iter().enumerate() {
                source.push_str(&format!("zp{} = ${:02X}\n", i, value));
            }
            for (i, value) in absolute.iter().enumerate() {
                source.push_str(&format!("abs{} = ${:04X}\n", i, value));
            }
            source.push_str(&format!("ORG ${:04X}\n", BASE));

            for (number, (kind, pick)) in lines.iter().enumerate() {
                let zp = pick % zero_page.len();
                let text = match kind {
                    0 => format!("LDA zp{}", zp),
                    1 => format!("STA abs{},X", pick % absolute.len()),
                    2 => format!("LDA zp{}.a", zp),
                    3 => format!("BNE l{}", pick % lines.len()),
                    4 => format!("JSR l{}", pick % lines.len()),
                    _ => format!("LDA (zp{}),Y", zp),
                };
                source.push_str(&format!("l{}: {}\n", number, text));
            }
            source
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: any stream of documented instructions round-trips byte for byte
    #[test]
    fn prop_instruction_stream_round_trips(stream in prop::collection::vec(instruction(), 1..64)) {
        let bytes: Vec<u8> = stream.concat();
        let image = ObjectCode::from_bytes(BASE, &bytes);

        prop_assert_eq!(reassemble(&image, BASE, bytes.len()), image);
    }

    /// Property: arbitrary bytes round-trip, undocumented ones as `DB`
    #[test]
    fn prop_arbitrary_bytes_round_trip(bytes in prop::collection::vec(any::<u8>(), 1..512)) {
        let image = ObjectCode::from_bytes(BASE, &bytes);

        prop_assert_eq!(reassemble(&image, BASE, bytes.len()), image);
    }

    /// Property: images assembled from source round-trip, including
    /// absolute operands below $0100
    #[test]
    fn prop_assembled_source_round_trips(
        lines in prop::collection::vec((prop::sample::select(documented()), any::<u16>()), 1..48)
    ) {
        let mut source = format!("ORG ${:04X}\n", BASE);
        for (metadata, operand) in &lines {
            source.push_str(&source_line(metadata, *operand));
            source.push('\n');
        }
        let original = match assemble(&source) {
            Ok(output) => output,
            Err(errors) => panic!("generated source failed: {:?}\n{}", errors, source),
        };
        let length = original.object_code.assigned_count();

        prop_assert_eq!(reassemble(&original.object_code, BASE, length), original.object_code);
    }

    /// Property: substituting names from the program's own symbol table
    /// keeps the output reassemblable to the same bytes
    #[test]
    fn prop_symbolic_program_round_trips(source in symbolic_program()) {
        let original = match assemble(&source) {
            Ok(output) => output,
            Err(errors) => panic!("generated source failed: {:?}\n{}", errors, source),
        };
        let length = original.object_code.assigned_count();

        prop_assert_eq!(
            reassemble_with(&original.object_code, Some(&original.symbols), BASE, length),
            original.object_code
        );
    }

    /// Property: walking a region never uses a fixed stride and covers it exactly
    #[test]
    fn prop_region_walk_covers_every_byte(bytes in prop::collection::vec(any::<u8>(), 1..256)) {
        let image = ObjectCode::from_bytes(BASE, &bytes);
        let dis = Disassembler::new(&image, DisassemblyOptions::default());

        let mut expected = BASE as u32;
        for line in dis.disassemble_region(BASE, bytes.len()) {
            prop_assert_eq!(line.address as u32, expected);
            prop_assert!((1..=3).contains(&line.length));
            expected += line.length as u32;
        }
        prop_assert_eq!(expected, BASE as u32 + bytes.len() as u32);
    }
}

#[test]
fn test_forced_absolute_zero_page_value_round_trips() {
    let original = assemble("ORG $0200\nLDA $0010.a\nSTA $00FF.a,X\nLDX $0001.a,Y\nJMP $0200").unwrap();
    let length = original.object_code.assigned_count();
    assert_eq!(reassemble(&original.object_code, 0x0200, length), original.object_code);
}

#[test]
fn test_every_documented_opcode_round_trips() {
    let mut bytes = Vec::new();
    for metadata in canonical_entries() {
        bytes.push(metadata.opcode);
        match metadata.size_bytes {
            2 => bytes.push(0x00),
            3 => bytes.extend_from_slice(&[0x12, 0x00]),
            _ => {}
        }
    }
    let image = ObjectCode::from_bytes(BASE, &bytes);
    assert_eq!(reassemble(&image, BASE, bytes.len()), image);
}
