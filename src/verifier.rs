//! # Round-trip Verifier
//!
//! Byte-level comparison of an original image against a candidate (usually
//! the result of disassembling and reassembling the original), plus a few
//! heuristics that suggest what went wrong when they differ.
//!
//! Mismatches are reported as values; nothing here is an error.

use std::fmt;

/// First byte that differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteDifference {
    pub offset: usize,
    pub address: u16,
    pub original: u8,
    pub candidate: u8,
}

/// Detected mismatch shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// A run of at least two differing bytes, all off by the same wrapping delta
    ConstantOffset { start: u16, length: usize, delta: u8 },
    /// Two adjacent bytes exchanged
    EndianSwap { address: u16 },
    /// A single isolated byte off by one
    OffByOne { address: u16 },
    /// Candidate is a strict prefix of the original
    Truncated { missing: usize },
    /// Lengths differ by one instruction's worth of bytes (1..=3)
    InstructionSizeDelta { difference: isize },
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Pattern::ConstantOffset { start, length, delta } => write!(
                f,
                "{} bytes from ${:04X} differ by a constant ${:02X} (wrong base address?)",
                length, start, delta
            ),
            Pattern::EndianSwap { address } => {
                write!(f, "bytes at ${:04X} are swapped (endianness?)", address)
            }
            Pattern::OffByOne { address } => write!(f, "byte at ${:04X} is off by one", address),
            Pattern::Truncated { missing } => {
                write!(f, "candidate is truncated, {} bytes missing", missing)
            }
            Pattern::InstructionSizeDelta { difference } => write!(
                f,
                "length differs by {} bytes (missing or extra operand?)",
                difference
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchReport {
    /// `None` when the shorter input is a prefix of the longer one
    pub first_difference: Option<ByteDifference>,
    /// Number of differing bytes within the common length
    pub differing_bytes: usize,
    /// `(original, candidate)` lengths when they differ
    pub length_difference: Option<(usize, usize)>,
    pub patterns: Vec<Pattern>,
}

impl fmt::Display for MismatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(diff) = self.first_difference {
            writeln!(
                f,
                "first difference at ${:04X} (offset {}): original ${:02X}, candidate ${:02X}",
                diff.address, diff.offset, diff.original, diff.candidate
            )?;
            writeln!(f, "{} differing bytes", self.differing_bytes)?;
        }
        if let Some((original, candidate)) = self.length_difference {
            writeln!(f, "length: original {} bytes, candidate {} bytes", original, candidate)?;
        }
        for pattern in &self.patterns {
            writeln!(f, "pattern: {}", pattern)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    Identical,
    Mismatch(MismatchReport),
}

impl Comparison {
    pub fn is_identical(&self) -> bool {
        matches!(self, Comparison::Identical)
    }
}

/// Compare two byte sequences that both start at `base_address`.
///
/// # Examples
///
/// ```
/// use tool6502::verifier::{compare, Comparison, Pattern};
///
/// assert_eq!(compare(&[1, 2, 3], &[1, 2, 3], 0x0200), Comparison::Identical);
///
/// let Comparison::Mismatch(report) = compare(&[0xA9, 0x10], &[0xA9, 0x11], 0x0200) else {
///     panic!("expected a mismatch");
/// };
/// assert_eq!(report.first_difference.unwrap().address, 0x0201);
/// assert_eq!(report.patterns, vec![Pattern::OffByOne { address: 0x0201 }]);
/// ```
pub fn compare(original: &[u8], candidate: &[u8], base_address: u16) -> Comparison {
    if original == candidate {
        return Comparison::Identical;
    }

    let address = |offset: usize| base_address.wrapping_add(offset as u16);
    let common = original.len().min(candidate.len());
    let differing: Vec<usize> = (0..common)
        .filter(|&i| original[i] != candidate[i])
        .collect();

    let first_difference = differing.first().map(|&offset| ByteDifference {
        offset,
        address: address(offset),
        original: original[offset],
        candidate: candidate[offset],
    });

    let length_difference =
        (original.len() != candidate.len()).then_some((original.len(), candidate.len()));

    let mut patterns = byte_patterns(original, candidate, &differing, base_address);

    if candidate.len() < original.len() && differing.is_empty() {
        patterns.push(Pattern::Truncated {
            missing: original.len() - candidate.len(),
        });
    }
    let difference = candidate.len() as isize - original.len() as isize;
    if (1..=3).contains(&difference.abs()) {
        patterns.push(Pattern::InstructionSizeDelta { difference });
    }

    Comparison::Mismatch(MismatchReport {
        first_difference,
        differing_bytes: differing.len(),
        length_difference,
        patterns,
    })
}

fn byte_patterns(original: &[u8], candidate: &[u8], differing: &[usize], base: u16) -> Vec<Pattern> {
    let address = |offset: usize| base.wrapping_add(offset as u16);
    let delta = |i: usize| candidate[i].wrapping_sub(original[i]);
    let common = original.len().min(candidate.len());
    let differs = |i: usize| i < common && original[i] != candidate[i];
    let mut patterns = Vec::new();
    let mut index = 0;

    while index < differing.len() {
        let start = differing[index];

        // adjacent pair exchanged
        if let Some(&next) = differing.get(index + 1) {
            if next == start + 1
                && original[start] == candidate[next]
                && original[next] == candidate[start]
            {
                patterns.push(Pattern::EndianSwap {
                    address: address(start),
                });
                index += 2;
                continue;
            }
        }

        // run of consecutive differences with one delta
        let mut end = index + 1;
        while end < differing.len()
            && differing[end] == differing[end - 1] + 1
            && delta(differing[end]) == delta(start)
        {
            end += 1;
        }
        let length = end - index;

        if length >= 2 {
            patterns.push(Pattern::ConstantOffset {
                start: address(start),
                length,
                delta: delta(start),
            });
        } else {
            let isolated = (start == 0 || !differs(start - 1)) && !differs(start + 1);
            if isolated && matches!(delta(start), 0x01 | 0xFF) {
                patterns.push(Pattern::OffByOne {
                    address: address(start),
                });
            }
        }
        index = end;
    }

    patterns
}
