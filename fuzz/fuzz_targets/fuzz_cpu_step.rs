//! Fuzz target for a single CPU step.
//!
//! Arbitrary register state and memory contents, then one `execute()`.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tool6502::{ExecutionError, MemoryBus, MemoryMap, CPU};

#[derive(Debug, Arbitrary)]
struct FuzzCpuState {
    a: u8,
    x: u8,
    y: u8,
    sp: u8,
    status: u8,
    pc: u16,
}

#[derive(Debug, Arbitrary)]
struct FuzzMemory {
    instruction_bytes: [u8; 3],
    zero_page: [u8; 256],
    stack_page: [u8; 256],
    main_memory: [u8; 256],
    irq_vector: u16,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    cpu_state: FuzzCpuState,
    memory: FuzzMemory,
}

fuzz_target!(|input: FuzzInput| {
    let mut memory = MemoryMap::new();
    memory.load(0x0000, &input.memory.zero_page);
    memory.load(0x0100, &input.memory.stack_page);
    memory.load(0x4000, &input.memory.main_memory);
    memory.write(0xFFFE, input.memory.irq_vector as u8);
    memory.write(0xFFFF, (input.memory.irq_vector >> 8) as u8);
    memory.load(input.cpu_state.pc, &input.memory.instruction_bytes);

    let mut cpu = CPU::new(memory);
    cpu.set_pc(input.cpu_state.pc);
    cpu.set_a(input.cpu_state.a);
    cpu.set_x(input.cpu_state.x);
    cpu.set_y(input.cpu_state.y);
    cpu.set_sp(input.cpu_state.sp);
    cpu.set_status(input.cpu_state.status);

    let cycles_before = cpu.cycles();
    match cpu.execute() {
        Ok(()) => assert!(cpu.cycles() > cycles_before),
        Err(ExecutionError::IllegalOpcode { address, .. }) => {
            assert_eq!(address, input.cpu_state.pc)
        }
        Err(ExecutionError::MemoryOutOfRange { .. }) => {
            assert!(input.cpu_state.pc > 0xFFFD)
        }
    }
    // bit 5 always reads as set
    assert_eq!(cpu.status() & 0x20, 0x20);
});
