//! # Load and Store Instructions
//!
//! This module implements load and store operations:
//! - LDA: Load Accumulator
//! - LDX: Load X Register
//! - LDY: Load Y Register
//! - STA: Store Accumulator
//! - STX: Store X Register
//! - STY: Store Y Register
//!
//! Loads set Z and N only; stores affect no flags.

use crate::cpu::Operand;
use crate::{ExecutionError, MemoryBus, CPU};

/// Executes the LDA (Load Accumulator) instruction.
///
/// # Flag Behavior
///
/// - Zero (Z): Set if A = 0
/// - Negative (N): Set if bit 7 of A is set
/// - Other flags: Not affected
pub(crate) fn execute_lda<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let value = cpu.read_operand(operand);
    cpu.a = value;
    cpu.set_zn(value);
    Ok(())
}

/// Executes the LDX (Load X Register) instruction.
pub(crate) fn execute_ldx<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let value = cpu.read_operand(operand);
    cpu.x = value;
    cpu.set_zn(value);
    Ok(())
}

/// Executes the LDY (Load Y Register) instruction.
pub(crate) fn execute_ldy<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let value = cpu.read_operand(operand);
    cpu.y = value;
    cpu.set_zn(value);
    Ok(())
}

/// Executes the STA (Store Accumulator) instruction.
pub(crate) fn execute_sta<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    cpu.write_operand(operand, cpu.a);
    Ok(())
}

/// Executes the STX (Store X Register) instruction.
pub(crate) fn execute_stx<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    cpu.write_operand(operand, cpu.x);
    Ok(())
}

/// Executes the STY (Store Y Register) instruction.
pub(crate) fn execute_sty<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    cpu.write_operand(operand, cpu.y);
    Ok(())
}
