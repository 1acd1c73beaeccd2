//! # Object Code Image
//!
//! A sparse 64K image where each cell is either an assembled byte or a hole.
//! Presence is tracked per cell with `Option<u8>`, so there is no sentinel
//! value that could collide with real data.
//!
//! Cells are append-once: writing to a cell that already holds a byte is an
//! overlap error, even when the value is the same.

use std::fmt::Write as _;
use std::ops::RangeInclusive;

/// Attempted second write to an already assigned address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("address ${address:04X} already assigned (existing ${existing:02X}, new ${new:02X})")]
pub struct OverlapError {
    pub address: u16,
    pub existing: u8,
    pub new: u8,
}

/// A contiguous run of assigned bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub start: u16,
    pub bytes: Vec<u8>,
}

/// Sparse 64K object code image.
///
/// # Examples
///
/// ```
/// use tool6502::ObjectCode;
///
/// let mut image = ObjectCode::new();
/// image.write(0x0200, 0xA9).unwrap();
/// image.write(0x0201, 0x55).unwrap();
///
/// assert_eq!(image.get(0x0200), Some(0xA9));
/// assert_eq!(image.get(0x0202), None);
/// assert!(image.write(0x0200, 0xEA).is_err());
/// ```
#[derive(Clone)]
pub struct ObjectCode {
    cells: Box<[Option<u8>; 65536]>,
}

impl ObjectCode {
    /// Creates an empty image (every cell is a hole).
    pub fn new() -> Self {
        Self {
            cells: Box::new([None; 65536]),
        }
    }

    /// Builds an image from a contiguous byte slice at `base`.
    ///
    /// Bytes that would run past $FFFF are dropped.
    pub fn from_bytes(base: u16, bytes: &[u8]) -> Self {
        let mut image = Self::new();
        for (offset, &byte) in bytes.iter().enumerate() {
            let address = base as usize + offset;
            if address > 0xFFFF {
                break;
            }
            image.cells[address] = Some(byte);
        }
        image
    }

    /// Assigns a byte to an unassigned cell.
    pub fn write(&mut self, address: u16, value: u8) -> Result<(), OverlapError> {
        let cell = &mut self.cells[address as usize];
        match *cell {
            Some(existing) => Err(OverlapError {
                address,
                existing,
                new: value,
            }),
            None => {
                *cell = Some(value);
                Ok(())
            }
        }
    }

    /// Returns the byte at `address`, or `None` for a hole.
    pub fn get(&self, address: u16) -> Option<u8> {
        self.cells[address as usize]
    }

    pub fn is_assigned(&self, address: u16) -> bool {
        self.cells[address as usize].is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Number of assigned cells.
    pub fn assigned_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Lowest through highest assigned address, or `None` for an empty image.
    pub fn assigned_range(&self) -> Option<RangeInclusive<u16>> {
        let first = self.cells.iter().position(Option::is_some)?;
        let last = self.cells.iter().rposition(Option::is_some)?;
        Some(first as u16..=last as u16)
    }

    /// Iterates over `(address, byte)` for every assigned cell in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u8)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(address, cell)| cell.map(|byte| (address as u16, byte)))
    }

    /// Splits the image into maximal contiguous runs of assigned bytes.
    pub fn chunks(&self) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut previous: Option<u16> = None;

        for (address, byte) in self.iter() {
            match (previous, chunks.last_mut()) {
                (Some(prev), Some(chunk)) if prev.wrapping_add(1) == address => {
                    chunk.bytes.push(byte)
                }
                _ => chunks.push(Chunk {
                    start: address,
                    bytes: vec![byte],
                }),
            }
            previous = Some(address);
        }

        chunks
    }

    /// Flat binary covering the assigned range only; internal holes become `fill`.
    ///
    /// ```
    /// use tool6502::ObjectCode;
    ///
    /// let mut image = ObjectCode::new();
    /// image.write(0x1000, 0x01).unwrap();
    /// image.write(0x1002, 0x03).unwrap();
    /// assert_eq!(image.to_binary(0xFF), vec![0x01, 0xFF, 0x03]);
    /// ```
    pub fn to_binary(&self, fill: u8) -> Vec<u8> {
        match self.assigned_range() {
            Some(range) => range
                .map(|address| self.get(address).unwrap_or(fill))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Intel HEX text: data records of at most 16 bytes, each within one
    /// contiguous chunk, followed by the end-of-file record.
    pub fn to_intel_hex(&self) -> String {
        let mut out = String::new();

        for chunk in self.chunks() {
            for (index, record) in chunk.bytes.chunks(16).enumerate() {
                let address = chunk.start.wrapping_add((index * 16) as u16);
                let mut checksum = (record.len() as u8)
                    .wrapping_add((address >> 8) as u8)
                    .wrapping_add(address as u8);

                let _ = write!(out, ":{:02X}{:04X}00", record.len(), address);
                for &byte in record {
                    let _ = write!(out, "{:02X}", byte);
                    checksum = checksum.wrapping_add(byte);
                }
                let _ = writeln!(out, "{:02X}", checksum.wrapping_neg());
            }
        }

        out.push_str(":00000001FF\n");
        out
    }
}

impl Default for ObjectCode {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObjectCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectCode")
            .field("assigned_range", &self.assigned_range())
            .field("assigned_count", &self.assigned_count())
            .finish()
    }
}

impl PartialEq for ObjectCode {
    fn eq(&self, other: &Self) -> bool {
        self.cells[..] == other.cells[..]
    }
}

impl Eq for ObjectCode {}
