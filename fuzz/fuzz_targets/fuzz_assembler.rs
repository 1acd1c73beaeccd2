//! Fuzz target for the assembler.
//!
//! Arbitrary text must produce either output or a list of errors, never a
//! panic. Successful output must survive a reassemblable round trip.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tool6502::assembler::assemble;
use tool6502::disassembler::{Disassembler, DisassemblyOptions};

fuzz_target!(|data: &[u8]| {
    let source = String::from_utf8_lossy(data);

    let Ok(output) = assemble(&source) else {
        return;
    };

    let Some(range) = output.object_code.assigned_range() else {
        return;
    };

    let options = DisassemblyOptions {
        reassemblable: true,
        ..Default::default()
    };
    let length = (*range.end() - *range.start()) as usize + 1;
    let text = Disassembler::new(&output.object_code, options).render_source(*range.start(), length);

    let again = assemble(&text).expect("reassemblable output must assemble");
    assert_eq!(again.object_code, output.object_code);
});
