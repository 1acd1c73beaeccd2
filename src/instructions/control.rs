//! # Control Flow Instructions
//!
//! This module implements control flow operations:
//! - BRK: Force Interrupt
//! - JMP: Jump to address
//! - JSR / RTS: Subroutine call and return
//! - RTI: Return from interrupt
//!
//! BRK is a software interrupt that:
//! 1. Pushes PC+2 to the stack (high byte first, then low byte)
//! 2. Pushes processor status to stack with B flag set
//! 3. Sets the B and I flags
//! 4. Loads PC from IRQ vector at $FFFE/F
//!
//! Whether execution stops at a BRK is up to the session driving the CPU.

use crate::cpu::Operand;
use crate::{ExecutionError, MemoryBus, CPU};

/// Executes the BRK (Force Interrupt) instruction.
///
/// Cycle timing: 7 cycles (fixed)
pub(crate) fn execute_brk<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    // PC already points past the opcode; BRK skips one padding byte as well
    let return_address = cpu.pc.wrapping_add(1);

    cpu.push((return_address >> 8) as u8);
    cpu.push(return_address as u8);

    // Pushed status always carries B and bit 5
    let status = cpu.status() | 0b00110000;
    cpu.push(status);

    cpu.flag_b = true;
    cpu.flag_i = true;

    // Load PC from IRQ vector at $FFFE/F (little-endian)
    cpu.pc = cpu.memory.read_word(0xFFFE);

    Ok(())
}

/// Executes the JMP (Jump) instruction.
///
/// The indirect page-wrap bug is reproduced when the CPU resolves the operand.
pub(crate) fn execute_jmp<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    if let Operand::Address(target) = operand {
        cpu.pc = target;
    }
    Ok(())
}

/// Executes the JSR (Jump to Subroutine) instruction.
///
/// Pushes the address of the last byte of the JSR (return address - 1), high
/// byte first, then jumps.
pub(crate) fn execute_jsr<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let return_address = cpu.pc.wrapping_sub(1);
    cpu.push((return_address >> 8) as u8);
    cpu.push(return_address as u8);

    if let Operand::Address(target) = operand {
        cpu.pc = target;
    }
    Ok(())
}

/// Executes the RTS (Return from Subroutine) instruction.
pub(crate) fn execute_rts<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    let low = cpu.pull() as u16;
    let high = cpu.pull() as u16;
    cpu.pc = ((high << 8) | low).wrapping_add(1);
    Ok(())
}

/// Executes the RTI (Return from Interrupt) instruction.
///
/// Pulls the status byte (B cleared, bit 5 ignored) and then PC. Unlike RTS
/// the pulled address is used as is.
pub(crate) fn execute_rti<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    let status = cpu.pull();
    cpu.set_status(status & !0b00010000);

    let low = cpu.pull() as u16;
    let high = cpu.pull() as u16;
    cpu.pc = (high << 8) | low;
    Ok(())
}
