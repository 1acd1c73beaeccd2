//! # CPU State and Execution
//!
//! This module contains the CPU struct representing the 6502 processor state and
//! the single-step fetch-decode-execute cycle.
//!
//! ## CPU State
//!
//! The CPU maintains:
//! - **Registers**: Accumulator (A), index registers (X, Y)
//! - **Program counter** (PC): 16-bit address of next instruction
//! - **Stack pointer** (SP): 8-bit offset into stack page (0x0100-0x01FF)
//! - **Status flags**: N, V, B, D, I, Z, C (individual bool fields)
//! - **Cycle counter**: sum of base cycles of executed instructions
//!
//! ## Execution Model
//!
//! `execute()` runs exactly one instruction. Whether to keep stepping after a
//! BRK, an error or a stall is the caller's decision (see [`crate::session`]).

use crate::addressing::AddressingMode;
use crate::instructions::{alu, branches, control, flags, inc_dec, load_store, shifts, stack, transfer};
use crate::opcodes::{lookup_by_opcode, Operation};
use crate::{ExecutionError, MemoryBus};

/// Simulator settings, fixed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Emit a `tracing` event for every executed instruction
    pub trace: bool,
}

/// Decoded operand of the instruction being executed.
///
/// Produced once per step by the CPU from the addressing mode, so the
/// instruction implementations never deal with operand fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operand {
    /// Implied: no operand
    None,
    /// The accumulator register itself
    Accumulator,
    /// Literal byte from the instruction stream
    Immediate(u8),
    /// Effective memory address (for branches, the taken target)
    Address(u16),
}

/// 6502 CPU state and execution context.
///
/// The CPU struct contains all processor state including registers, flags, program counter,
/// stack pointer, and cycle counter. It is generic over the memory implementation via the
/// `MemoryBus` trait.
///
/// # Type Parameters
///
/// * `M` - Memory bus implementation (must implement `MemoryBus` trait)
///
/// # Examples
///
/// ```
/// use tool6502::{CPU, MemoryMap, MemoryBus};
///
/// // Create memory and set reset vector
/// let mut memory = MemoryMap::new();
/// memory.write(0xFFFC, 0x00); // Low byte
/// memory.write(0xFFFD, 0x80); // High byte (PC = 0x8000)
/// memory.write(0x8000, 0xA9); // LDA #$42
/// memory.write(0x8001, 0x42);
///
/// let mut cpu = CPU::new(memory);
/// cpu.execute().unwrap();
///
/// assert_eq!(cpu.a(), 0x42);
/// assert_eq!(cpu.pc(), 0x8002);
/// ```
pub struct CPU<M: MemoryBus> {
    /// Accumulator register
    pub(crate) a: u8,

    /// X index register
    pub(crate) x: u8,

    /// Y index register
    pub(crate) y: u8,

    /// Program counter (address of next instruction)
    pub(crate) pc: u16,

    /// Stack pointer (0x0100 + sp gives full stack address)
    pub(crate) sp: u8,

    /// Negative flag (set if bit 7 of result is 1)
    pub(crate) flag_n: bool,

    /// Overflow flag (set on signed overflow)
    pub(crate) flag_v: bool,

    /// Break flag (set when BRK instruction executed)
    pub(crate) flag_b: bool,

    /// Decimal mode flag (enables BCD arithmetic)
    pub(crate) flag_d: bool,

    /// Interrupt disable flag
    pub(crate) flag_i: bool,

    /// Zero flag (set if result is zero)
    pub(crate) flag_z: bool,

    /// Carry flag (set on unsigned overflow/underflow)
    pub(crate) flag_c: bool,

    /// Total CPU cycles executed
    pub(crate) cycles: u64,

    /// Memory bus implementation
    pub(crate) memory: M,

    config: SimulatorConfig,
}

impl<M: MemoryBus> CPU<M> {
    /// Creates a new CPU with the given memory bus.
    ///
    /// The CPU is initialized to the 6502 power-on reset state:
    /// - Program counter (PC) is loaded from the reset vector at addresses 0xFFFC/0xFFFD (little-endian)
    /// - Stack pointer (SP) is set to 0xFD
    /// - Status register has Interrupt Disable flag set (I = true)
    /// - All other registers (A, X, Y) are zeroed
    /// - Cycle counter is reset to 0
    pub fn new(memory: M) -> Self {
        Self::with_config(memory, SimulatorConfig::default())
    }

    /// Creates a CPU in the reset state with explicit simulator settings.
    pub fn with_config(memory: M, config: SimulatorConfig) -> Self {
        // Read reset vector from 0xFFFC/0xFFFD (little-endian)
        let pc = memory.read_word(0xFFFC);

        Self {
            a: 0x00,
            x: 0x00,
            y: 0x00,
            pc,
            sp: 0xFD,
            flag_n: false,
            flag_v: false,
            flag_b: false,
            flag_d: false,
            flag_i: true, // Interrupt disable set on reset
            flag_z: false,
            flag_c: false,
            cycles: 0,
            memory,
            config,
        }
    }

    /// Executes one instruction and advances the CPU state.
    ///
    /// 1. Fetch the opcode byte at PC
    /// 2. Resolve it through the instruction table
    /// 3. Fetch operand bytes and compute the effective address or immediate value
    /// 4. Point PC at the following instruction
    /// 5. Apply the instruction, which may redirect PC (branch, jump, call, return, break)
    ///
    /// On error the CPU state is left untouched.
    ///
    /// # Errors
    ///
    /// - `ExecutionError::IllegalOpcode` if the byte has no table entry
    /// - `ExecutionError::MemoryOutOfRange` if the instruction bytes run past $FFFF
    ///
    /// # Examples
    ///
    /// ```
    /// use tool6502::{CPU, MemoryMap, MemoryBus, ExecutionError};
    ///
    /// let mut mem = MemoryMap::new();
    /// mem.set_reset_vector(0x8000);
    /// mem.write(0x8000, 0x02); // no documented instruction
    ///
    /// let mut cpu = CPU::new(mem);
    /// assert_eq!(
    ///     cpu.execute(),
    ///     Err(ExecutionError::IllegalOpcode { opcode: 0x02, address: 0x8000 })
    /// );
    /// assert_eq!(cpu.pc(), 0x8000);
    /// ```
    pub fn execute(&mut self) -> Result<(), ExecutionError> {
        let address = self.pc;
        let opcode = self.memory.read(address);

        let metadata = lookup_by_opcode(opcode)
            .ok_or(ExecutionError::IllegalOpcode { opcode, address })?;

        let end = address as u32 + metadata.size_bytes as u32;
        if end > 0x1_0000 {
            return Err(ExecutionError::MemoryOutOfRange { address: 0xFFFF });
        }
        let next_pc = end as u16;

        if self.config.trace {
            tracing::trace!(
                pc = format_args!("${:04X}", address),
                opcode = format_args!("${:02X}", opcode),
                mnemonic = metadata.mnemonic,
                "execute"
            );
        }

        let operand = self.decode_operand(metadata.addressing_mode, address, next_pc);
        self.pc = next_pc;

        match metadata.operation {
            // Load/store
            Operation::Lda => load_store::execute_lda(self, operand),
            Operation::Ldx => load_store::execute_ldx(self, operand),
            Operation::Ldy => load_store::execute_ldy(self, operand),
            Operation::Sta => load_store::execute_sta(self, operand),
            Operation::Stx => load_store::execute_stx(self, operand),
            Operation::Sty => load_store::execute_sty(self, operand),

            // Arithmetic and logic
            Operation::Adc => alu::execute_adc(self, operand),
            Operation::Sbc => alu::execute_sbc(self, operand),
            Operation::And => alu::execute_and(self, operand),
            Operation::Ora => alu::execute_ora(self, operand),
            Operation::Eor => alu::execute_eor(self, operand),
            Operation::Cmp => alu::execute_cmp(self, operand),
            Operation::Cpx => alu::execute_cpx(self, operand),
            Operation::Cpy => alu::execute_cpy(self, operand),
            Operation::Bit => alu::execute_bit(self, operand),

            // Shifts and rotates
            Operation::Asl => shifts::execute_asl(self, operand),
            Operation::Lsr => shifts::execute_lsr(self, operand),
            Operation::Rol => shifts::execute_rol(self, operand),
            Operation::Ror => shifts::execute_ror(self, operand),

            // Increment/decrement
            Operation::Inc => inc_dec::execute_inc(self, operand),
            Operation::Dec => inc_dec::execute_dec(self, operand),
            Operation::Inx => inc_dec::execute_inx(self),
            Operation::Iny => inc_dec::execute_iny(self),
            Operation::Dex => inc_dec::execute_dex(self),
            Operation::Dey => inc_dec::execute_dey(self),

            // Branches
            Operation::Bcc
            | Operation::Bcs
            | Operation::Beq
            | Operation::Bne
            | Operation::Bmi
            | Operation::Bpl
            | Operation::Bvs
            | Operation::Bvc => branches::execute_branch(self, metadata.operation, operand),

            // Control flow
            Operation::Brk => control::execute_brk(self),
            Operation::Jmp => control::execute_jmp(self, operand),
            Operation::Jsr => control::execute_jsr(self, operand),
            Operation::Rts => control::execute_rts(self),
            Operation::Rti => control::execute_rti(self),
            Operation::Nop => Ok(()),

            // Stack
            Operation::Pha => stack::execute_pha(self),
            Operation::Php => stack::execute_php(self),
            Operation::Pla => stack::execute_pla(self),
            Operation::Plp => stack::execute_plp(self),

            // Flags
            Operation::Clc => flags::execute_clc(self),
            Operation::Sec => flags::execute_sec(self),
            Operation::Cli => flags::execute_cli(self),
            Operation::Sei => flags::execute_sei(self),
            Operation::Clv => flags::execute_clv(self),
            Operation::Cld => flags::execute_cld(self),
            Operation::Sed => flags::execute_sed(self),

            // Register transfers
            Operation::Tax => transfer::execute_tax(self),
            Operation::Tay => transfer::execute_tay(self),
            Operation::Txa => transfer::execute_txa(self),
            Operation::Tya => transfer::execute_tya(self),
            Operation::Tsx => transfer::execute_tsx(self),
            Operation::Txs => transfer::execute_txs(self),
        }?;

        self.cycles += metadata.base_cycles as u64;
        Ok(())
    }

    /// Executes up to `steps` instructions, stopping at the first error.
    ///
    /// Returns the number of instructions executed.
    pub fn run_for_steps(&mut self, steps: u64) -> Result<u64, ExecutionError> {
        for executed in 0..steps {
            if let Err(e) = self.execute() {
                tracing::debug!(executed, error = %e, "run stopped");
                return Err(e);
            }
        }
        Ok(steps)
    }

    /// Computes the operand for an instruction at `address` whose successor is at `next_pc`.
    fn decode_operand(&self, mode: AddressingMode, address: u16, next_pc: u16) -> Operand {
        let byte = || self.memory.read(address.wrapping_add(1));
        let word = || self.memory.read_word(address.wrapping_add(1));

        match mode {
            AddressingMode::Implied => Operand::None,
            AddressingMode::Accumulator => Operand::Accumulator,
            AddressingMode::Immediate => Operand::Immediate(byte()),
            AddressingMode::ZeroPage => Operand::Address(byte() as u16),
            AddressingMode::ZeroPageX => Operand::Address(byte().wrapping_add(self.x) as u16),
            AddressingMode::ZeroPageY => Operand::Address(byte().wrapping_add(self.y) as u16),
            AddressingMode::Absolute => Operand::Address(word()),
            AddressingMode::AbsoluteX => Operand::Address(word().wrapping_add(self.x as u16)),
            AddressingMode::AbsoluteY => Operand::Address(word().wrapping_add(self.y as u16)),
            AddressingMode::Indirect => {
                // 6502 bug: the high byte is fetched without crossing the page
                let pointer = word();
                let low = self.memory.read(pointer) as u16;
                let high_addr = (pointer & 0xFF00) | (pointer.wrapping_add(1) & 0x00FF);
                let high = self.memory.read(high_addr) as u16;
                Operand::Address((high << 8) | low)
            }
            AddressingMode::IndirectX => {
                let pointer = byte().wrapping_add(self.x);
                Operand::Address(self.read_zero_page_word(pointer))
            }
            AddressingMode::IndirectY => {
                let base = self.read_zero_page_word(byte());
                Operand::Address(base.wrapping_add(self.y as u16))
            }
            AddressingMode::Relative => {
                let offset = byte() as i8;
                Operand::Address(next_pc.wrapping_add_signed(offset as i16))
            }
        }
    }

    /// Reads a pointer from zero page, wrapping within zero page.
    fn read_zero_page_word(&self, pointer: u8) -> u16 {
        let low = self.memory.read(pointer as u16) as u16;
        let high = self.memory.read(pointer.wrapping_add(1) as u16) as u16;
        (high << 8) | low
    }

    // ========== Helpers for instruction implementations ==========

    /// Reads the value an operand denotes.
    pub(crate) fn read_operand(&self, operand: Operand) -> u8 {
        match operand {
            Operand::None => 0,
            Operand::Accumulator => self.a,
            Operand::Immediate(value) => value,
            Operand::Address(addr) => self.memory.read(addr),
        }
    }

    /// Stores a value to the accumulator or memory location an operand denotes.
    pub(crate) fn write_operand(&mut self, operand: Operand, value: u8) {
        match operand {
            Operand::Accumulator => self.a = value,
            Operand::Address(addr) => self.memory.write(addr, value),
            Operand::None | Operand::Immediate(_) => {}
        }
    }

    /// Sets Z and N from a result byte.
    pub(crate) fn set_zn(&mut self, value: u8) {
        self.flag_z = value == 0;
        self.flag_n = (value & 0x80) != 0;
    }

    pub(crate) fn push(&mut self, value: u8) {
        let stack_addr = 0x0100 | (self.sp as u16);
        self.memory.write(stack_addr, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub(crate) fn pull(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.memory.read(0x0100 | (self.sp as u16))
    }

    // ========== Register Getters ==========

    /// Returns the accumulator register value.
    pub fn a(&self) -> u8 {
        self.a
    }

    /// Returns the X index register value.
    pub fn x(&self) -> u8 {
        self.x
    }

    /// Returns the Y index register value.
    pub fn y(&self) -> u8 {
        self.y
    }

    /// Returns the program counter value.
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Returns the stack pointer value.
    ///
    /// Note: The full stack address is 0x0100 + SP. The stack grows downward from 0x01FF.
    pub fn sp(&self) -> u8 {
        self.sp
    }

    /// Returns the status register as a packed byte.
    ///
    /// Bit layout (NV-BDIZC):
    /// - Bit 7: N (Negative)
    /// - Bit 6: V (Overflow)
    /// - Bit 5: (unused, always 1)
    /// - Bit 4: B (Break)
    /// - Bit 3: D (Decimal)
    /// - Bit 2: I (Interrupt Disable)
    /// - Bit 1: Z (Zero)
    /// - Bit 0: C (Carry)
    pub fn status(&self) -> u8 {
        let mut status: u8 = 0b00100000; // Bit 5 always 1

        if self.flag_n {
            status |= 0b10000000;
        }
        if self.flag_v {
            status |= 0b01000000;
        }
        if self.flag_b {
            status |= 0b00010000;
        }
        if self.flag_d {
            status |= 0b00001000;
        }
        if self.flag_i {
            status |= 0b00000100;
        }
        if self.flag_z {
            status |= 0b00000010;
        }
        if self.flag_c {
            status |= 0b00000001;
        }

        status
    }

    /// Returns the total number of CPU cycles executed since initialization.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Shared access to the memory bus.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Mutable access to the memory bus.
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Consumes the CPU, returning its memory.
    pub fn into_memory(self) -> M {
        self.memory
    }

    pub fn config(&self) -> SimulatorConfig {
        self.config
    }

    // ========== Status Flag Getters ==========

    /// Returns true if the Negative flag is set.
    pub fn flag_n(&self) -> bool {
        self.flag_n
    }

    /// Returns true if the Overflow flag is set.
    pub fn flag_v(&self) -> bool {
        self.flag_v
    }

    /// Returns true if the Break flag is set.
    pub fn flag_b(&self) -> bool {
        self.flag_b
    }

    /// Returns true if the Decimal mode flag is set.
    pub fn flag_d(&self) -> bool {
        self.flag_d
    }

    /// Returns true if the Interrupt Disable flag is set.
    pub fn flag_i(&self) -> bool {
        self.flag_i
    }

    /// Returns true if the Zero flag is set.
    pub fn flag_z(&self) -> bool {
        self.flag_z
    }

    /// Returns true if the Carry flag is set.
    pub fn flag_c(&self) -> bool {
        self.flag_c
    }

    // ========== Setters ==========

    pub fn set_a(&mut self, value: u8) {
        self.a = value;
    }

    pub fn set_x(&mut self, value: u8) {
        self.x = value;
    }

    pub fn set_y(&mut self, value: u8) {
        self.y = value;
    }

    pub fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    pub fn set_sp(&mut self, value: u8) {
        self.sp = value;
    }

    /// Unpacks a status byte into the individual flags. Bit 5 is ignored.
    pub fn set_status(&mut self, value: u8) {
        self.flag_n = value & 0b10000000 != 0;
        self.flag_v = value & 0b01000000 != 0;
        self.flag_b = value & 0b00010000 != 0;
        self.flag_d = value & 0b00001000 != 0;
        self.flag_i = value & 0b00000100 != 0;
        self.flag_z = value & 0b00000010 != 0;
        self.flag_c = value & 0b00000001 != 0;
    }

    pub fn set_flag_n(&mut self, value: bool) {
        self.flag_n = value;
    }

    pub fn set_flag_v(&mut self, value: bool) {
        self.flag_v = value;
    }

    pub fn set_flag_d(&mut self, value: bool) {
        self.flag_d = value;
    }

    pub fn set_flag_i(&mut self, value: bool) {
        self.flag_i = value;
    }

    pub fn set_flag_z(&mut self, value: bool) {
        self.flag_z = value;
    }

    pub fn set_flag_c(&mut self, value: bool) {
        self.flag_c = value;
    }
}
