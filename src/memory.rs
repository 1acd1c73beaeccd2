//! # Memory Bus Abstraction
//!
//! The `MemoryBus` trait decouples the CPU from a specific memory
//! implementation. `MemoryMap` is the flat 64K RAM the toolchain simulates
//! programs in; it is the only mutable resource a simulation session touches.

use crate::object_code::ObjectCode;

/// Memory bus trait for CPU to read/write bytes.
///
/// # Design
///
/// - `read(&self)`: Immutable reference allows shared reads
/// - `write(&mut self)`: Mutable reference makes side effects explicit
/// - No error types: every 16-bit address is addressable
///
/// # Examples
///
/// ```
/// use tool6502::{MemoryBus, MemoryMap};
///
/// let mut mem = MemoryMap::new();
/// mem.write(0x1234, 0x42);
/// assert_eq!(mem.read(0x1234), 0x42);
/// ```
pub trait MemoryBus {
    /// Reads a byte from the specified 16-bit address.
    fn read(&self, addr: u16) -> u8;

    /// Writes a byte to the specified 16-bit address.
    fn write(&mut self, addr: u16, value: u8);

    /// Reads a little-endian word from `addr` and `addr + 1` (wrapping at $FFFF).
    fn read_word(&self, addr: u16) -> u16 {
        let low = self.read(addr) as u16;
        let high = self.read(addr.wrapping_add(1)) as u16;
        (high << 8) | low
    }
}

/// Flat 64KB memory.
///
/// All addresses (0x0000-0xFFFF) are writable RAM initialized to 0x00.
///
/// # Examples
///
/// ```
/// use tool6502::{CPU, MemoryMap, MemoryBus};
///
/// let mut memory = MemoryMap::new();
/// memory.write(0xFFFC, 0x00); // Reset vector low byte
/// memory.write(0xFFFD, 0x80); // Reset vector high byte (PC = 0x8000)
///
/// let cpu = CPU::new(memory);
/// assert_eq!(cpu.pc(), 0x8000);
/// ```
#[derive(Clone)]
pub struct MemoryMap {
    /// 64KB contiguous memory array
    data: Box<[u8; 65536]>,
}

impl MemoryMap {
    /// Creates a new MemoryMap with all bytes initialized to zero.
    pub fn new() -> Self {
        Self {
            data: Box::new([0; 65536]),
        }
    }

    /// Copies a byte slice into memory starting at `base`, wrapping at $FFFF.
    pub fn load(&mut self, base: u16, bytes: &[u8]) {
        let mut address = base;
        for &byte in bytes {
            self.data[address as usize] = byte;
            address = address.wrapping_add(1);
        }
    }

    /// Copies every assigned cell of an object code image; holes leave the
    /// existing memory contents untouched.
    ///
    /// ```
    /// use tool6502::{MemoryBus, MemoryMap, ObjectCode};
    ///
    /// let mut image = ObjectCode::new();
    /// image.write(0x0300, 0x42).unwrap();
    ///
    /// let mut mem = MemoryMap::new();
    /// mem.write(0x0301, 0x99);
    /// mem.load_object_code(&image);
    /// assert_eq!(mem.read(0x0300), 0x42);
    /// assert_eq!(mem.read(0x0301), 0x99);
    /// ```
    pub fn load_object_code(&mut self, image: &ObjectCode) {
        for (address, byte) in image.iter() {
            self.data[address as usize] = byte;
        }
    }

    /// Sets the reset vector at $FFFC/$FFFD.
    pub fn set_reset_vector(&mut self, address: u16) {
        self.data[0xFFFC] = address as u8;
        self.data[0xFFFD] = (address >> 8) as u8;
    }

    /// Borrow a region of memory.
    pub fn slice(&self, start: u16, len: usize) -> &[u8] {
        let start = start as usize;
        let end = (start + len).min(self.data.len());
        &self.data[start..end]
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus for MemoryMap {
    fn read(&self, addr: u16) -> u8 {
        self.data[addr as usize]
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.data[addr as usize] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_map_read_write() {
        let mut mem = MemoryMap::new();

        // Initially all zeros
        assert_eq!(mem.read(0x0000), 0x00);
        assert_eq!(mem.read(0xFFFF), 0x00);

        mem.write(0x1234, 0x42);
        assert_eq!(mem.read(0x1234), 0x42);

        // Verify other addresses unchanged
        assert_eq!(mem.read(0x1233), 0x00);
        assert_eq!(mem.read(0x1235), 0x00);
    }

    #[test]
    fn test_read_word_wraps() {
        let mut mem = MemoryMap::new();
        mem.write(0xFFFF, 0x34);
        mem.write(0x0000, 0x12);
        assert_eq!(mem.read_word(0xFFFF), 0x1234);
    }

    #[test]
    fn test_load_wraps_and_slice_clamps() {
        let mut mem = MemoryMap::new();
        mem.load(0xFFFF, &[0xAA, 0xBB]);
        assert_eq!(mem.read(0xFFFF), 0xAA);
        assert_eq!(mem.read(0x0000), 0xBB);
        assert_eq!(mem.slice(0xFFFE, 10).len(), 2);
    }

    #[test]
    fn test_reset_vector() {
        let mut mem = MemoryMap::new();
        mem.set_reset_vector(0x0200);
        assert_eq!(mem.read_word(0xFFFC), 0x0200);
    }
}
