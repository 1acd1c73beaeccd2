//! # ALU (Arithmetic Logic Unit) Instructions
//!
//! This module implements arithmetic and logical operations:
//! - ADC / SBC: Add and subtract with carry (binary and decimal mode)
//! - AND / ORA / EOR: Bitwise logic on the accumulator
//! - CMP / CPX / CPY: Register compares
//! - BIT: Bit test

use crate::cpu::Operand;
use crate::{ExecutionError, MemoryBus, CPU};

/// Executes the ADC (Add with Carry) instruction.
///
/// Adds the operand plus the carry flag to the accumulator. In decimal mode the
/// accumulator and carry follow NMOS BCD rules; N, V and Z always reflect the
/// binary sum.
pub(crate) fn execute_adc<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let value = cpu.read_operand(operand);
    let a = cpu.a;
    let carry_in = cpu.flag_c as u16;

    // Perform addition with carry
    let result16 = a as u16 + value as u16 + carry_in;
    let binary = result16 as u8;

    // Overflow flag: both operands had the same sign but the result differs
    cpu.flag_v = ((a ^ binary) & (value ^ binary) & 0x80) != 0;
    cpu.set_zn(binary);

    if cpu.flag_d {
        let mut low = (a & 0x0F) as u16 + (value & 0x0F) as u16 + carry_in;
        if low > 0x09 {
            low += 0x06;
        }
        let mut high = (a >> 4) as u16 + (value >> 4) as u16 + (low > 0x0F) as u16;
        if high > 0x09 {
            high += 0x06;
        }
        cpu.flag_c = high > 0x0F;
        cpu.a = ((high << 4) | (low & 0x0F)) as u8;
    } else {
        // Carry flag: Set if result > 255
        cpu.flag_c = result16 > 0xFF;
        cpu.a = binary;
    }

    Ok(())
}

/// Executes the SBC (Subtract with Carry) instruction.
///
/// Computes A - M - (1 - C). Carry is set when no borrow occurred.
pub(crate) fn execute_sbc<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let value = cpu.read_operand(operand);
    let a = cpu.a;
    let borrow = (!cpu.flag_c) as i16;

    // Binary subtraction is addition of the one's complement
    let inverted = !value;
    let result16 = a as u16 + inverted as u16 + cpu.flag_c as u16;
    let binary = result16 as u8;

    cpu.flag_v = ((a ^ binary) & (inverted ^ binary) & 0x80) != 0;
    cpu.set_zn(binary);
    cpu.flag_c = result16 > 0xFF;

    if cpu.flag_d {
        let mut low = (a & 0x0F) as i16 - (value & 0x0F) as i16 - borrow;
        let mut high = (a >> 4) as i16 - (value >> 4) as i16;
        if low < 0 {
            low -= 0x06;
            high -= 1;
        }
        if high < 0 {
            high -= 0x06;
        }
        cpu.a = ((high << 4) | (low & 0x0F)) as u8;
    } else {
        cpu.a = binary;
    }

    Ok(())
}

/// Executes the AND (Logical AND) instruction. Updates Z and N.
pub(crate) fn execute_and<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let result = cpu.a & cpu.read_operand(operand);
    cpu.a = result;
    cpu.set_zn(result);
    Ok(())
}

/// Executes the ORA (Logical Inclusive OR) instruction. Updates Z and N.
pub(crate) fn execute_ora<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let result = cpu.a | cpu.read_operand(operand);
    cpu.a = result;
    cpu.set_zn(result);
    Ok(())
}

/// Executes the EOR (Exclusive OR) instruction. Updates Z and N.
pub(crate) fn execute_eor<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let result = cpu.a ^ cpu.read_operand(operand);
    cpu.a = result;
    cpu.set_zn(result);
    Ok(())
}

/// Shared compare: sets C if register >= operand, Z if equal, N from bit 7 of
/// the difference. The register itself is never written.
fn compare<M: MemoryBus>(cpu: &mut CPU<M>, register: u8, operand: Operand) {
    let value = cpu.read_operand(operand);
    let result = register.wrapping_sub(value);
    cpu.flag_c = register >= value;
    cpu.set_zn(result);
}

/// Executes the CMP (Compare Accumulator) instruction.
pub(crate) fn execute_cmp<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let register = cpu.a;
    compare(cpu, register, operand);
    Ok(())
}

/// Executes the CPX (Compare X Register) instruction.
pub(crate) fn execute_cpx<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let register = cpu.x;
    compare(cpu, register, operand);
    Ok(())
}

/// Executes the CPY (Compare Y Register) instruction.
pub(crate) fn execute_cpy<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let register = cpu.y;
    compare(cpu, register, operand);
    Ok(())
}

/// Executes the BIT (Bit Test) instruction.
///
/// - Z: Set if A & M == 0
/// - N: Bit 7 of M
/// - V: Bit 6 of M
pub(crate) fn execute_bit<M: MemoryBus>(
    cpu: &mut CPU<M>,
    operand: Operand,
) -> Result<(), ExecutionError> {
    let value = cpu.read_operand(operand);
    cpu.flag_z = (cpu.a & value) == 0;
    cpu.flag_n = (value & 0x80) != 0;
    cpu.flag_v = (value & 0x40) != 0;
    Ok(())
}
