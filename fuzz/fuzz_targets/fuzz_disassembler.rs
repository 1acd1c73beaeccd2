//! Fuzz target for the disassembler.
//!
//! Arbitrary bytes are disassembled in reassemblable mode and assembled
//! again; the result must be byte-identical.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tool6502::assembler::assemble;
use tool6502::disassembler::{disassemble, Disassembler, DisassemblyOptions};
use tool6502::ObjectCode;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    bytes: Vec<u8>,
    page: u8,
}

fuzz_target!(|input: FuzzInput| {
    let start = (input.page as u16) << 8;
    if input.bytes.is_empty()
        || input.bytes.len() > 4096
        || input.bytes.len() > 0x10000 - start as usize
    {
        return;
    }

    let options = DisassemblyOptions {
        start_address: start,
        reassemblable: true,
        show_bytes: false,
    };

    let instructions = disassemble(&input.bytes, options);
    let total: usize = instructions.iter().map(|i| i.size_bytes as usize).sum();
    assert_eq!(total, input.bytes.len());

    let image = ObjectCode::from_bytes(start, &input.bytes);
    let text = Disassembler::new(&image, options).render_source(start, input.bytes.len());

    let again = assemble(&text).expect("reassemblable output must assemble");
    assert_eq!(again.object_code, image);
});
