//! # Stack Operations
//!
//! This module implements stack manipulation instructions:
//! - PHA / PLA: Push and pull the accumulator
//! - PHP / PLP: Push and pull the status register
//!
//! The 6502 stack is located at memory addresses 0x0100-0x01FF and grows downward.
//! The stack pointer (SP) is an 8-bit register that serves as an offset into this
//! page. The full stack address is calculated as 0x0100 | SP.

use crate::{ExecutionError, MemoryBus, CPU};

/// Executes the PHA (Push Accumulator) instruction. No flags affected.
pub(crate) fn execute_pha<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    cpu.push(cpu.a);
    Ok(())
}

/// Executes the PHP (Push Processor Status) instruction.
///
/// The pushed byte always has B and bit 5 set.
pub(crate) fn execute_php<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    cpu.push(cpu.status() | 0b00110000);
    Ok(())
}

/// Executes the PLA (Pull Accumulator) instruction. Updates Z and N.
pub(crate) fn execute_pla<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    let value = cpu.pull();
    cpu.a = value;
    cpu.set_zn(value);
    Ok(())
}

/// Executes the PLP (Pull Processor Status) instruction.
///
/// B is not a physical flag, so the pulled B bit is discarded.
pub(crate) fn execute_plp<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    let status = cpu.pull();
    cpu.set_status(status & !0b00010000);
    Ok(())
}
