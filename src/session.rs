//! # Simulation Sessions
//!
//! Drives a [`CPU`] through repeated `execute()` calls under a step ceiling.
//! The CPU itself never decides to stop; this is where BRK handling, stall
//! detection and tracing policy live.

use std::fmt;

use crate::opcodes::lookup_by_opcode;
use crate::{ExecutionError, MemoryBus, CPU};

/// Opcodes that may legitimately leave PC where it was (branches, JMP, JSR).
const CONTROL_FLOW_OPCODES: [u8; 11] = [
    0x10, 0x30, 0x50, 0x70, 0x90, 0xB0, 0xD0, 0xF0, // branches
    0x4C, 0x6C, // JMP
    0x20, // JSR
];

/// Session policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Maximum number of instructions to execute
    pub max_steps: u64,
    /// Stop before executing a BRK
    pub stop_on_brk: bool,
    /// Stop when PC does not move after a non-control-flow instruction
    pub detect_stalls: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            stop_on_brk: true,
            detect_stalls: true,
        }
    }
}

/// CPU state captured just before an instruction executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub step: u64,
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub flags: u8,
    pub opcode: u8,
}

impl TraceRecord {
    /// Column header matching the `Display` layout.
    pub const HEADER: &'static str = "Step\tPC\tA\tX\tY\tSP\tFlags\tInstruction";

    pub fn capture<M: MemoryBus>(step: u64, cpu: &CPU<M>) -> Self {
        Self {
            step,
            pc: cpu.pc(),
            a: cpu.a(),
            x: cpu.x(),
            y: cpu.y(),
            sp: cpu.sp(),
            flags: cpu.status(),
            opcode: cpu.memory().read(cpu.pc()),
        }
    }

    /// Canonical mnemonic of the opcode about to execute, if documented.
    pub fn mnemonic(&self) -> Option<&'static str> {
        lookup_by_opcode(self.opcode).map(|m| m.mnemonic)
    }
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t${:04X}\t${:02X}\t${:02X}\t${:02X}\t${:02X}\t${:02X}\t${:02X}",
            self.step, self.pc, self.a, self.x, self.y, self.sp, self.flags, self.opcode
        )
    }
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The step ceiling was reached
    StepLimit,
    /// A BRK is next and the session is configured to stop there
    Break { pc: u16 },
    /// PC did not move after a non-control-flow instruction
    Stall { pc: u16 },
    /// The CPU reported an execution error
    Error(ExecutionError),
}

/// Result of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Instructions successfully executed
    pub steps: u64,
    pub stop_reason: StopReason,
}

/// Runs the CPU under `config`, handing a [`TraceRecord`] to `observer`
/// before each step (including the BRK a session stops at).
///
/// # Examples
///
/// ```
/// use tool6502::session::{run, RunConfig, StopReason};
/// use tool6502::{CPU, MemoryMap};
///
/// let mut mem = MemoryMap::new();
/// mem.load(0x0200, &[0xA9, 0x01, 0xAA, 0x00]); // LDA #1; TAX; BRK
/// mem.set_reset_vector(0x0200);
///
/// let mut cpu = CPU::new(mem);
/// let mut trace = Vec::new();
/// let outcome = run(&mut cpu, &RunConfig::default(), |r| trace.push(*r));
///
/// assert_eq!(outcome.steps, 2);
/// assert_eq!(outcome.stop_reason, StopReason::Break { pc: 0x0203 });
/// assert_eq!(trace.len(), 3);
/// assert_eq!(cpu.x(), 1);
/// ```
pub fn run<M, F>(cpu: &mut CPU<M>, config: &RunConfig, mut observer: F) -> RunOutcome
where
    M: MemoryBus,
    F: FnMut(&TraceRecord),
{
    let mut steps = 0;

    tracing::debug!(
        start = format_args!("${:04X}", cpu.pc()),
        max_steps = config.max_steps,
        "starting simulation"
    );

    let stop_reason = loop {
        if steps >= config.max_steps {
            break StopReason::StepLimit;
        }

        let record = TraceRecord::capture(steps, cpu);
        observer(&record);

        if config.stop_on_brk && record.opcode == 0x00 {
            break StopReason::Break { pc: record.pc };
        }

        if let Err(e) = cpu.execute() {
            tracing::warn!(step = steps, error = %e, "execution error");
            break StopReason::Error(e);
        }
        steps += 1;

        if config.detect_stalls
            && cpu.pc() == record.pc
            && !CONTROL_FLOW_OPCODES.contains(&record.opcode)
        {
            tracing::warn!(pc = format_args!("${:04X}", record.pc), "possible infinite loop");
            break StopReason::Stall { pc: record.pc };
        }
    };

    tracing::debug!(steps, reason = ?stop_reason, "simulation finished");

    RunOutcome { steps, stop_reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryMap;

    fn cpu_at(program: &[u8]) -> CPU<MemoryMap> {
        let mut mem = MemoryMap::new();
        mem.load(0x0200, program);
        mem.set_reset_vector(0x0200);
        CPU::new(mem)
    }

    #[test]
    fn test_step_limit() {
        // JMP $0200 loops forever but is control flow, so no stall
        let mut cpu = cpu_at(&[0x4C, 0x00, 0x02]);
        let config = RunConfig {
            max_steps: 25,
            ..RunConfig::default()
        };
        let outcome = run(&mut cpu, &config, |_| {});
        assert_eq!(outcome.steps, 25);
        assert_eq!(outcome.stop_reason, StopReason::StepLimit);
    }

    #[test]
    fn test_brk_to_self_is_a_stall() {
        // BRK at $0000 vectoring back to $0000
        let mut mem = MemoryMap::new();
        mem.set_reset_vector(0x0000);
        let mut cpu = CPU::new(mem);
        let config = RunConfig {
            stop_on_brk: false,
            ..RunConfig::default()
        };
        let outcome = run(&mut cpu, &config, |_| {});
        assert_eq!(outcome.steps, 1);
        assert_eq!(outcome.stop_reason, StopReason::Stall { pc: 0x0000 });
    }

    #[test]
    fn test_error_stops_session() {
        let mut cpu = cpu_at(&[0xEA, 0x02]);
        let outcome = run(&mut cpu, &RunConfig::default(), |_| {});
        assert_eq!(outcome.steps, 1);
        assert_eq!(
            outcome.stop_reason,
            StopReason::Error(ExecutionError::IllegalOpcode {
                opcode: 0x02,
                address: 0x0201
            })
        );
    }

    #[test]
    fn test_trace_record_format() {
        let cpu = cpu_at(&[0xA9, 0x55]);
        let record = TraceRecord::capture(0, &cpu);
        assert_eq!(record.to_string(), "0\t$0200\t$00\t$00\t$00\t$FD\t$24\t$A9");
        assert_eq!(record.mnemonic(), Some("LDA"));
    }
}
