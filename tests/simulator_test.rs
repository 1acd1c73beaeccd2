//! Instruction semantics and session behaviour of the simulator.
//!
//! Tests cover:
//! - The assemble / load / step scenario end to end
//! - Flag rules for loads, arithmetic (binary and decimal), compares and shifts
//! - Stack, subroutine and interrupt round trips
//! - Error reporting for illegal opcodes

use tool6502::assembler::assemble;
use tool6502::session::{run, RunConfig, StopReason};
use tool6502::{ExecutionError, MemoryBus, MemoryMap, CPU};

/// CPU with `program` at 0x8000 and the reset vector pointing there
fn setup_cpu(program: &[u8]) -> CPU<MemoryMap> {
    let mut memory = MemoryMap::new();
    memory.load(0x8000, program);
    memory.set_reset_vector(0x8000);
    CPU::new(memory)
}

// ========== End-to-end scenario ==========

#[test]
fn test_assemble_load_and_step() {
    let output = assemble("ORG $0200\nstart: LDA #$55\nSTA $10\nBRK").unwrap();
    assert_eq!(output.bytes(), vec![0xA9, 0x55, 0x85, 0x10, 0x00]);
    assert_eq!(output.lookup_symbol_addr("start"), Some(0x0200));

    let mut memory = MemoryMap::new();
    memory.load_object_code(&output.object_code);
    memory.set_reset_vector(0x0200);
    let mut cpu = CPU::new(memory);

    cpu.execute().unwrap();
    assert_eq!(cpu.a(), 0x55);
    assert!(!cpu.flag_z());
    assert!(!cpu.flag_n());
    assert_eq!(cpu.pc(), 0x0202);

    cpu.execute().unwrap();
    assert_eq!(cpu.memory().read(0x0010), 0x55);
    assert_eq!(cpu.pc(), 0x0204);

    cpu.execute().unwrap();
    assert!(cpu.flag_b());
    assert!(cpu.flag_i());
    assert_eq!(cpu.sp(), 0xFA);
    // return address $0206, high byte first
    assert_eq!(cpu.memory().read(0x01FD), 0x02);
    assert_eq!(cpu.memory().read(0x01FC), 0x06);
    // pushed status carries B and bit 5
    assert_eq!(cpu.memory().read(0x01FB), 0b0011_0100);
}

// ========== Loads ==========

#[test]
fn test_lda_zero_leaves_c_and_v() {
    let mut cpu = setup_cpu(&[0xA9, 0x00]); // LDA #$00
    cpu.set_flag_c(true);
    cpu.set_flag_v(true);
    cpu.set_flag_n(true);

    cpu.execute().unwrap();

    assert!(cpu.flag_z());
    assert!(!cpu.flag_n());
    assert!(cpu.flag_c());
    assert!(cpu.flag_v());
}

#[test]
fn test_lda_negative() {
    let mut cpu = setup_cpu(&[0xA9, 0x80]); // LDA #$80
    cpu.execute().unwrap();
    assert!(cpu.flag_n());
    assert!(!cpu.flag_z());
    assert_eq!(cpu.cycles(), 2);
}

#[test]
fn test_indexed_indirect_and_indirect_indexed() {
    // LDA ($20,X); LDA ($30),Y
    let mut cpu = setup_cpu(&[0xA1, 0x20, 0xB1, 0x30]);
    cpu.set_x(0x04);
    cpu.set_y(0x10);
    let mem = cpu.memory_mut();
    mem.write(0x0024, 0x00);
    mem.write(0x0025, 0x40);
    mem.write(0x4000, 0x11);
    mem.write(0x0030, 0xF8);
    mem.write(0x0031, 0x40);
    mem.write(0x4108, 0x22);

    cpu.execute().unwrap();
    assert_eq!(cpu.a(), 0x11);
    cpu.execute().unwrap();
    assert_eq!(cpu.a(), 0x22);
}

#[test]
fn test_zero_page_indexing_wraps() {
    // LDA $F0,X with X=$20 reads $0010, not $0110
    let mut cpu = setup_cpu(&[0xB5, 0xF0]);
    cpu.set_x(0x20);
    cpu.memory_mut().write(0x0010, 0x77);
    cpu.memory_mut().write(0x0110, 0x99);

    cpu.execute().unwrap();
    assert_eq!(cpu.a(), 0x77);
}

#[test]
fn test_indirect_pointer_wraps_in_zero_page() {
    // LDA ($FF),Y takes the high byte from $0000
    let mut cpu = setup_cpu(&[0xB1, 0xFF]);
    cpu.set_y(0x01);
    let mem = cpu.memory_mut();
    mem.write(0x00FF, 0x00);
    mem.write(0x0000, 0x30);
    mem.write(0x3001, 0x5A);

    cpu.execute().unwrap();
    assert_eq!(cpu.a(), 0x5A);
}

#[test]
fn test_jmp_indirect_page_bug() {
    // JMP ($30FF) fetches the high byte from $3000
    let mut cpu = setup_cpu(&[0x6C, 0xFF, 0x30]);
    let mem = cpu.memory_mut();
    mem.write(0x30FF, 0x80);
    mem.write(0x3000, 0x12);
    mem.write(0x3100, 0x56);

    cpu.execute().unwrap();
    assert_eq!(cpu.pc(), 0x1280);
}

// ========== Arithmetic ==========

#[test]
fn test_adc_signed_overflow() {
    let mut cpu = setup_cpu(&[0x69, 0x50]); // ADC #$50
    cpu.set_a(0x50);
    cpu.execute().unwrap();

    assert_eq!(cpu.a(), 0xA0);
    assert!(cpu.flag_v());
    assert!(cpu.flag_n());
    assert!(!cpu.flag_c());
}

#[test]
fn test_adc_carry_out() {
    let mut cpu = setup_cpu(&[0x69, 0x01]); // ADC #$01
    cpu.set_a(0xFF);
    cpu.set_flag_c(true);
    cpu.execute().unwrap();

    assert_eq!(cpu.a(), 0x01);
    assert!(cpu.flag_c());
    assert!(!cpu.flag_z());
    assert!(!cpu.flag_v());
}

#[test]
fn test_sbc_borrow() {
    let mut cpu = setup_cpu(&[0xE9, 0xF0]); // SBC #$F0
    cpu.set_a(0x50);
    cpu.set_flag_c(true);
    cpu.execute().unwrap();

    assert_eq!(cpu.a(), 0x60);
    assert!(!cpu.flag_c());
    assert!(!cpu.flag_v());
}

#[test]
fn test_decimal_mode_adc() {
    let mut cpu = setup_cpu(&[0xF8, 0x69, 0x46]); // SED; ADC #$46
    cpu.set_a(0x58);
    cpu.set_flag_c(true);
    cpu.run_for_steps(2).unwrap();

    assert_eq!(cpu.a(), 0x05);
    assert!(cpu.flag_c());
}

#[test]
fn test_decimal_mode_sbc() {
    let mut cpu = setup_cpu(&[0xF8, 0x38, 0xE9, 0x12]); // SED; SEC; SBC #$12
    cpu.set_a(0x46);
    cpu.run_for_steps(3).unwrap();

    assert_eq!(cpu.a(), 0x34);
    assert!(cpu.flag_c());
}

// ========== Compares ==========

#[test]
fn test_compare_only_touches_flags() {
    let mut cpu = setup_cpu(&[0xC9, 0x40, 0xE0, 0x50]); // CMP #$40; CPX #$50
    cpu.set_a(0x40);
    cpu.set_x(0x40);

    cpu.execute().unwrap();
    assert_eq!(cpu.a(), 0x40);
    assert!(cpu.flag_z());
    assert!(cpu.flag_c());
    assert!(!cpu.flag_n());

    cpu.execute().unwrap();
    assert_eq!(cpu.x(), 0x40);
    assert!(!cpu.flag_z());
    assert!(!cpu.flag_c());
    assert!(cpu.flag_n());
}

#[test]
fn test_bit_copies_operand_bits() {
    let mut cpu = setup_cpu(&[0x24, 0x10]); // BIT $10
    cpu.memory_mut().write(0x0010, 0xC0);
    cpu.set_a(0x01);
    cpu.execute().unwrap();

    assert!(cpu.flag_z());
    assert!(cpu.flag_n());
    assert!(cpu.flag_v());
    assert_eq!(cpu.a(), 0x01);
}

// ========== Shifts ==========

#[test]
fn test_asl_accumulator_carry_out() {
    let mut cpu = setup_cpu(&[0x0A]); // ASL A
    cpu.set_a(0x81);
    cpu.execute().unwrap();

    assert_eq!(cpu.a(), 0x02);
    assert!(cpu.flag_c());
    assert!(!cpu.flag_n());
}

#[test]
fn test_ror_memory_through_carry() {
    let mut cpu = setup_cpu(&[0x66, 0x20]); // ROR $20
    cpu.memory_mut().write(0x0020, 0x01);
    cpu.set_flag_c(true);
    cpu.execute().unwrap();

    assert_eq!(cpu.memory().read(0x0020), 0x80);
    assert!(cpu.flag_c());
    assert!(cpu.flag_n());
}

// ========== Stack and control flow ==========

#[test]
fn test_each_branch_tests_its_flag() {
    // (opcode, status bit, taken when the bit is set)
    let branches = [
        (0x10, 0x80, false), // BPL
        (0x30, 0x80, true),  // BMI
        (0x50, 0x40, false), // BVC
        (0x70, 0x40, true),  // BVS
        (0x90, 0x01, false), // BCC
        (0xB0, 0x01, true),  // BCS
        (0xD0, 0x02, false), // BNE
        (0xF0, 0x02, true),  // BEQ
    ];

    for (opcode, bit, when_set) in branches {
        for set in [false, true] {
            let mut cpu = setup_cpu(&[opcode, 0x10]);
            cpu.set_status(if set { bit } else { 0 });
            cpu.execute().unwrap();

            let expected = if set == when_set { 0x8012 } else { 0x8002 };
            assert_eq!(cpu.pc(), expected, "opcode ${:02X} with bit set: {}", opcode, set);
            assert_eq!(cpu.cycles(), 2);
        }
    }
}

#[test]
fn test_jsr_rts_round_trip() {
    // $8000 JSR $8005; $8003 BRK; $8004 BRK; $8005 RTS
    let mut cpu = setup_cpu(&[0x20, 0x05, 0x80, 0x00, 0x00, 0x60]);

    cpu.execute().unwrap();
    assert_eq!(cpu.pc(), 0x8005);
    assert_eq!(cpu.sp(), 0xFB);
    assert_eq!(cpu.memory().read(0x01FD), 0x80);
    assert_eq!(cpu.memory().read(0x01FC), 0x02);

    cpu.execute().unwrap();
    assert_eq!(cpu.pc(), 0x8003);
    assert_eq!(cpu.sp(), 0xFD);
}

#[test]
fn test_brk_rti_round_trip() {
    // $8000 CLI; $8001 BRK; $8002 padding; handler at $9000 is RTI
    let mut cpu = setup_cpu(&[0x58, 0x00, 0xEA]);
    let mem = cpu.memory_mut();
    mem.write(0xFFFE, 0x00);
    mem.write(0xFFFF, 0x90);
    mem.write(0x9000, 0x40);

    cpu.run_for_steps(2).unwrap();
    assert_eq!(cpu.pc(), 0x9000);
    assert!(cpu.flag_i());
    assert!(cpu.flag_b());

    cpu.execute().unwrap();
    assert_eq!(cpu.pc(), 0x8003);
    assert!(!cpu.flag_i());
    assert!(!cpu.flag_b());
    assert_eq!(cpu.sp(), 0xFD);
}

#[test]
fn test_php_plp_discards_break_bit() {
    let mut cpu = setup_cpu(&[0x08, 0x28]); // PHP; PLP
    cpu.set_flag_c(true);
    cpu.execute().unwrap();
    assert_eq!(cpu.memory().read(0x01FD), 0b0011_0101);

    cpu.execute().unwrap();
    assert!(cpu.flag_c());
    assert!(cpu.flag_i());
    assert!(!cpu.flag_b());
}

#[test]
fn test_pha_pla() {
    let mut cpu = setup_cpu(&[0x48, 0xA9, 0x01, 0x68]); // PHA; LDA #1; PLA
    cpu.set_a(0x00);
    cpu.run_for_steps(3).unwrap();

    assert_eq!(cpu.a(), 0x00);
    assert!(cpu.flag_z());
    assert_eq!(cpu.sp(), 0xFD);
}

// ========== Errors ==========

#[test]
fn test_illegal_opcode_leaves_state() {
    let mut cpu = setup_cpu(&[0xEA, 0xFF]);
    cpu.execute().unwrap();

    let err = cpu.execute().unwrap_err();
    assert_eq!(
        err,
        ExecutionError::IllegalOpcode {
            opcode: 0xFF,
            address: 0x8001
        }
    );
    assert_eq!(err.to_string(), "illegal opcode $FF at $8001");
    assert_eq!(cpu.pc(), 0x8001);
    assert_eq!(cpu.cycles(), 2);
}

#[test]
fn test_run_for_steps_stops_at_error() {
    let mut cpu = setup_cpu(&[0xEA, 0xEA, 0x02]);
    assert!(cpu.run_for_steps(5).is_err());
    assert_eq!(cpu.pc(), 0x8002);
}

// ========== Sessions ==========

#[test]
fn test_countdown_loop_session() {
    let output = assemble("ORG $0300\nLDX #3\nloop: DEX\nBNE loop\nBRK").unwrap();
    let mut memory = MemoryMap::new();
    memory.load_object_code(&output.object_code);
    memory.set_reset_vector(0x0300);
    let mut cpu = CPU::new(memory);

    let mut pcs = Vec::new();
    let outcome = run(&mut cpu, &RunConfig::default(), |r| pcs.push(r.pc));

    assert_eq!(outcome.steps, 7);
    assert_eq!(outcome.stop_reason, StopReason::Break { pc: 0x0305 });
    assert_eq!(cpu.x(), 0);
    assert_eq!(pcs.len(), 8);
    assert_eq!(pcs[..3], [0x0300, 0x0302, 0x0303]);
}

#[test]
fn test_jump_to_self_runs_to_step_limit() {
    // JMP to itself keeps PC fixed but is control flow, so it is not a stall
    let mut cpu = setup_cpu(&[0x4C, 0x00, 0x80]);
    let config = RunConfig {
        max_steps: 100,
        ..RunConfig::default()
    };
    let outcome = run(&mut cpu, &config, |_| {});
    assert_eq!(outcome.stop_reason, StopReason::StepLimit);
    assert_eq!(outcome.steps, 100);
}
