//! # tool6502
//!
//! A MOS 6502 toolchain: a two-pass assembler with pluggable macros, a
//! disassembler whose output reassembles byte-for-byte, an instruction-level
//! simulator, and a verifier that explains round-trip mismatches.
//!
//! Every part works from one opcode table ([`OPCODE_TABLE`]), so the
//! assembler and the disassembler can never disagree on an encoding.
//!
//! ## Quick Start
//!
//! ```rust
//! use tool6502::assembler::assemble;
//! use tool6502::{MemoryMap, CPU};
//!
//! let output = assemble("ORG $0200\nLDA #$05\nCLC\nADC #$03\nBRK").unwrap();
//!
//! let mut memory = MemoryMap::new();
//! memory.load_object_code(&output.object_code);
//! memory.set_reset_vector(0x0200);
//!
//! let mut cpu = CPU::new(memory);
//! cpu.run_for_steps(3).unwrap();
//! assert_eq!(cpu.a(), 0x08);
//! ```
//!
//! ## Modules
//!
//! - `opcodes` / `addressing` / `resolver` - instruction table and mode selection
//! - `assembler` - source text to [`ObjectCode`]
//! - `disassembler` - [`ObjectCode`] back to text
//! - `cpu` / `memory` / `session` - the simulator and its run loop
//! - `verifier` - byte comparison with mismatch heuristics

pub mod addressing;
pub mod assembler;
pub mod cpu;
pub mod disassembler;
pub mod memory;
pub mod object_code;
pub mod opcodes;
pub mod resolver;
pub mod session;
pub mod verifier;

#[cfg(feature = "wasm")]
pub mod wasm;

// Internal instruction implementations (not part of public API)
mod instructions;

pub use addressing::AddressingMode;
pub use cpu::{SimulatorConfig, CPU};
pub use memory::{MemoryBus, MemoryMap};
pub use object_code::ObjectCode;
pub use opcodes::{lookup_by_mnemonic, lookup_by_opcode, OpcodeMetadata, Operation, OPCODE_TABLE};

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// The byte at `address` is not a documented opcode.
    #[error("illegal opcode ${opcode:02X} at ${address:04X}")]
    IllegalOpcode { opcode: u8, address: u16 },

    /// An instruction reached outside the memory the bus provides.
    #[error("memory access out of range at ${address:04X}")]
    MemoryOutOfRange { address: u16 },
}
