//! # Branch Instructions
//!
//! This module implements the eight conditional branches:
//! BCC, BCS, BEQ, BNE, BMI, BPL, BVC, BVS.
//!
//! All branch instructions use relative addressing with a signed 8-bit offset.
//! The CPU has already resolved the offset into the taken target, relative to
//! the address after the branch. No flags are affected.

use crate::cpu::Operand;
use crate::opcodes::Operation;
use crate::{ExecutionError, MemoryBus, CPU};

/// Executes the conditional branch `operation`.
///
/// When the condition holds PC becomes the target; otherwise PC already points
/// at the next instruction and is left alone.
pub(crate) fn execute_branch<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operation: Operation,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let taken = match operation {
        Operation::Bcc => !cpu.flag_c,
        Operation::Bcs => cpu.flag_c,
        Operation::Beq => cpu.flag_z,
        Operation::Bne => !cpu.flag_z,
        Operation::Bmi => cpu.flag_n,
        Operation::Bpl => !cpu.flag_n,
        Operation::Bvc => !cpu.flag_v,
        Operation::Bvs => cpu.flag_v,
        _ => false,
    };

    if let (true, Operand::Address(target)) = (taken, operand) {
        cpu.pc = target;
    }

    Ok(())
}
