//! WebAssembly bindings for the toolchain.
//!
//! Exposes an assemble / step / disassemble session to JavaScript.

pub mod api;

pub use api::Toolchain6502;
