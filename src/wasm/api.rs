//! WASM API for the toolchain.
//!
//! One [`Toolchain6502`] owns a simulated machine; JavaScript assembles source
//! into it, steps the CPU and reads back state and disassembly.

use crate::assembler::assemble;
use crate::disassembler::{Disassembler, DisassemblyOptions};
use crate::{MemoryBus, MemoryMap, ObjectCode, CPU};
use wasm_bindgen::prelude::*;

/// JavaScript-compatible error wrapper
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsError {
    message: String,
}

#[wasm_bindgen]
impl JsError {
    #[wasm_bindgen(constructor)]
    pub fn new(message: &str) -> JsError {
        JsError {
            message: message.to_string(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn message(&self) -> String {
        self.message.clone()
    }
}

/// Result of assembly operation
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct AssemblyResult {
    success: bool,
    machine_code: Vec<u8>,
    start_addr: u16,
    end_addr: u16,
    errors: Vec<String>,
    error_line: Option<usize>,
}

#[wasm_bindgen]
impl AssemblyResult {
    #[wasm_bindgen(getter)]
    pub fn success(&self) -> bool {
        self.success
    }

    #[wasm_bindgen(getter)]
    pub fn machine_code(&self) -> Vec<u8> {
        self.machine_code.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn start_addr(&self) -> u16 {
        self.start_addr
    }

    /// Last used address (inclusive)
    #[wasm_bindgen(getter)]
    pub fn end_addr(&self) -> u16 {
        self.end_addr
    }

    /// Every error, one message per entry
    #[wasm_bindgen(getter)]
    pub fn errors(&self) -> js_sys::Array {
        self.errors.iter().map(|e| JsValue::from_str(e)).collect()
    }

    /// Line of the first error
    #[wasm_bindgen(getter)]
    pub fn error_line(&self) -> Option<usize> {
        self.error_line
    }
}

/// One line of disassembly
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct DisassemblyLine {
    address: u16,
    bytes: Vec<u8>,
    text: String,
}

#[wasm_bindgen]
impl DisassemblyLine {
    #[wasm_bindgen(getter)]
    pub fn address(&self) -> u16 {
        self.address
    }

    #[wasm_bindgen(getter)]
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn text(&self) -> String {
        self.text.clone()
    }
}

/// Assembler, simulator and disassembler sharing one 64KB machine
#[wasm_bindgen]
pub struct Toolchain6502 {
    cpu: CPU<MemoryMap>,
    program: ObjectCode,
}

impl Default for Toolchain6502 {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Toolchain6502 {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Toolchain6502 {
            cpu: CPU::new(MemoryMap::new()),
            program: ObjectCode::new(),
        }
    }

    /// Assemble `source`; on success the program is loaded and PC points at
    /// its first byte.
    pub fn assemble(&mut self, source: &str) -> AssemblyResult {
        match assemble(source) {
            Ok(output) => {
                let (start_addr, end_addr) = output
                    .object_code
                    .assigned_range()
                    .map(|r| (*r.start(), *r.end()))
                    .unwrap_or((0, 0));
                let machine_code = output.bytes();

                let mut memory = MemoryMap::new();
                memory.load_object_code(&output.object_code);
                memory.set_reset_vector(start_addr);
                self.cpu = CPU::new(memory);
                self.program = output.object_code;

                AssemblyResult {
                    success: true,
                    machine_code,
                    start_addr,
                    end_addr,
                    errors: Vec::new(),
                    error_line: None,
                }
            }
            Err(errors) => AssemblyResult {
                success: false,
                machine_code: Vec::new(),
                start_addr: 0,
                end_addr: 0,
                error_line: errors.first().map(|e| e.line),
                errors: errors.iter().map(|e| e.to_string()).collect(),
            },
        }
    }

    /// Execute a single instruction
    pub fn step(&mut self) -> Result<(), JsError> {
        self.cpu
            .execute()
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Execute up to `steps` instructions, returning how many ran
    pub fn run_for_steps(&mut self, steps: u32) -> Result<u32, JsError> {
        self.cpu
            .run_for_steps(steps as u64)
            .map(|n| n as u32)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Reload the last assembled program and reset the CPU
    pub fn reset(&mut self) {
        let mut memory = MemoryMap::new();
        memory.load_object_code(&self.program);
        memory.set_reset_vector(
            self.program
                .assigned_range()
                .map(|r| *r.start())
                .unwrap_or(0),
        );
        self.cpu = CPU::new(memory);
    }

    #[wasm_bindgen(getter)]
    pub fn a(&self) -> u8 {
        self.cpu.a()
    }

    #[wasm_bindgen(getter)]
    pub fn x(&self) -> u8 {
        self.cpu.x()
    }

    #[wasm_bindgen(getter)]
    pub fn y(&self) -> u8 {
        self.cpu.y()
    }

    #[wasm_bindgen(getter)]
    pub fn pc(&self) -> u16 {
        self.cpu.pc()
    }

    #[wasm_bindgen(getter)]
    pub fn sp(&self) -> u8 {
        self.cpu.sp()
    }

    /// Packed NV-BDIZC byte
    #[wasm_bindgen(getter)]
    pub fn status(&self) -> u8 {
        self.cpu.status()
    }

    #[wasm_bindgen(getter)]
    pub fn cycles(&self) -> f64 {
        self.cpu.cycles() as f64 // u64 does not cross into JS
    }

    pub fn set_pc(&mut self, addr: u16) {
        self.cpu.set_pc(addr);
    }

    pub fn read_memory(&self, addr: u16) -> u8 {
        self.cpu.memory().read(addr)
    }

    pub fn write_memory(&mut self, addr: u16, value: u8) {
        self.cpu.memory_mut().write(addr, value);
    }

    /// Read a 256-byte page from memory
    pub fn get_memory_page(&self, page: u8) -> Vec<u8> {
        let start = (page as u16) << 8;
        self.cpu.memory().slice(start, 256).to_vec()
    }

    /// Disassemble up to `count` instructions of current memory from `start_addr`
    pub fn disassemble(&self, start_addr: u16, count: u32) -> js_sys::Array {
        let length = 0x10000 - start_addr as usize;
        let image = ObjectCode::from_bytes(start_addr, self.cpu.memory().slice(start_addr, length));

        Disassembler::new(&image, DisassemblyOptions::default())
            .disassemble_region(start_addr, length)
            .take(count as usize)
            .map(|line| {
                JsValue::from(DisassemblyLine {
                    address: line.address,
                    bytes: line.instruction.bytes(),
                    text: line.text,
                })
            })
            .collect()
    }
}
