//! # Status Flag Manipulation Instructions
//!
//! This module implements instructions that directly modify processor status flags:
//! - CLC: Clear Carry Flag
//! - SEC: Set Carry Flag
//! - CLI: Clear Interrupt Disable
//! - SEI: Set Interrupt Disable
//! - CLV: Clear Overflow Flag
//! - CLD: Clear Decimal Mode
//! - SED: Set Decimal Mode
//!
//! These instructions use implied addressing mode and execute in 2 cycles.

use crate::{ExecutionError, MemoryBus, CPU};

pub(crate) fn execute_clc<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    cpu.flag_c = false;
    Ok(())
}

pub(crate) fn execute_sec<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    cpu.flag_c = true;
    Ok(())
}

pub(crate) fn execute_cli<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    cpu.flag_i = false;
    Ok(())
}

pub(crate) fn execute_sei<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    cpu.flag_i = true;
    Ok(())
}

/// There is no SEV; V is only set by ADC, SBC and BIT.
pub(crate) fn execute_clv<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    cpu.flag_v = false;
    Ok(())
}

pub(crate) fn execute_cld<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    cpu.flag_d = false;
    Ok(())
}

pub(crate) fn execute_sed<M: MemoryBus>(cpu: &mut CPU<M>) -> Result<(), ExecutionError> {
    cpu.flag_d = true;
    Ok(())
}
