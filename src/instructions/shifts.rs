//! # Shift and Rotate Instructions
//!
//! This module implements bit shift and rotate operations:
//! - ASL: Arithmetic Shift Left
//! - LSR: Logical Shift Right
//! - ROL: Rotate Left
//! - ROR: Rotate Right
//!
//! All four work on the accumulator or a memory location, set C from the bit
//! shifted out, and update Z and N from the result.

use crate::cpu::Operand;
use crate::{ExecutionError, MemoryBus, CPU};

fn shift_with<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
    op: impl FnOnce(u8, bool) -> (u8, bool),
) -> Result<(), ExecutionError> {
    let value = cpu.read_operand(operand);
    let (result, carry_out) = op(value, cpu.flag_c);
    cpu.write_operand(operand, result);
    cpu.flag_c = carry_out;
    cpu.set_zn(result);
    Ok(())
}

/// Executes the ASL (Arithmetic Shift Left) instruction.
pub(crate) fn execute_asl<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    shift_with(cpu, operand, |value, _| (value << 1, value & 0x80 != 0))
}

/// Executes the LSR (Logical Shift Right) instruction. N is always cleared.
pub(crate) fn execute_lsr<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    shift_with(cpu, operand, |value, _| (value >> 1, value & 0x01 != 0))
}

/// Executes the ROL (Rotate Left) instruction. Old carry enters bit 0.
pub(crate) fn execute_rol<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    shift_with(cpu, operand, |value, carry| {
        ((value << 1) | carry as u8, value & 0x80 != 0)
    })
}

/// Executes the ROR (Rotate Right) instruction. Old carry enters bit 7.
pub(crate) fn execute_ror<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    shift_with(cpu, operand, |value, carry| {
        ((value >> 1) | ((carry as u8) << 7), value & 0x01 != 0)
    })
}
