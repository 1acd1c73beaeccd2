//! # Increment and Decrement Instructions
//!
//! This module implements increment and decrement operations:
//! - INC / DEC: Memory
//! - INX / INY / DEX / DEY: Index registers
//!
//! All wrap on overflow and update Z and N only.

use crate::cpu::Operand;
use crate::{ExecutionError, MemoryBus, CPU};

/// Executes the INC (Increment Memory) instruction.
pub(crate) fn execute_inc<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let result = cpu.read_operand(operand).wrapping_add(1);
    cpu.write_operand(operand, result);
    cpu.set_zn(result);
    Ok(())
}

/// Executes the DEC (Decrement Memory) instruction.
pub(crate) fn execute_dec<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let result = cpu.read_operand(operand).wrapping_sub(1);
    cpu.write_operand(operand, result);
    cpu.set_zn(result);
    Ok(())
}

pub(crate) fn execute_inx<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    cpu.x = cpu.x.wrapping_add(1);
    cpu.set_zn(cpu.x);
    Ok(())
}

pub(crate) fn execute_iny<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    cpu.y = cpu.y.wrapping_add(1);
    cpu.set_zn(cpu.y);
    Ok(())
}

pub(crate) fn execute_dex<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    cpu.x = cpu.x.wrapping_sub(1);
    cpu.set_zn(cpu.x);
    Ok(())
}

pub(crate) fn execute_dey<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    cpu.y = cpu.y.wrapping_sub(1);
    cpu.set_zn(cpu.y);
    Ok(())
}
