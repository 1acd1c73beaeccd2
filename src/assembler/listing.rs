//! Assembly listing: source line ↔ address ↔ encoded bytes
//!
//! Besides the printable listing this doubles as the source map used by
//! debuggers to go from a program counter back to a source line.

use std::fmt::Write as _;

/// Bytes shown per listing row; longer emissions continue on extra rows.
const BYTES_PER_ROW: usize = 3;

/// One source line of the listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLine {
    /// Line number (1-indexed)
    pub line_number: usize,

    /// Address of the first emitted byte, or of the cursor for lines that emit nothing
    pub address: Option<u16>,

    pub bytes: Vec<u8>,

    /// Original source text
    pub source: String,
}

impl ListingLine {
    /// Addresses covered by the emitted bytes (end exclusive).
    fn covers(&self, address: u16) -> bool {
        match self.address {
            Some(start) if !self.bytes.is_empty() => {
                let offset = address.wrapping_sub(start) as usize;
                address >= start && offset < self.bytes.len()
            }
            _ => false,
        }
    }
}

/// Listing for a whole assembly, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    lines: Vec<ListingLine>,
}

impl Listing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: ListingLine) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[ListingLine] {
        &self.lines
    }

    /// Source line whose emitted bytes include `address`.
    ///
    /// ```
    /// use tool6502::assembler::listing::{Listing, ListingLine};
    ///
    /// let mut listing = Listing::new();
    /// listing.push(ListingLine {
    ///     line_number: 3,
    ///     address: Some(0x0200),
    ///     bytes: vec![0xA9, 0x55],
    ///     source: "LDA #$55".into(),
    /// });
    /// assert_eq!(listing.line_for_address(0x0201).map(|l| l.line_number), Some(3));
    /// assert!(listing.line_for_address(0x0202).is_none());
    /// ```
    pub fn line_for_address(&self, address: u16) -> Option<&ListingLine> {
        self.lines.iter().find(|line| line.covers(address))
    }

    /// Address range `(start, end_exclusive)` emitted by a source line.
    pub fn address_range(&self, line_number: usize) -> Option<(u16, u32)> {
        let line = self
            .lines
            .iter()
            .find(|l| l.line_number == line_number && !l.bytes.is_empty())?;
        let start = line.address?;
        Some((start, start as u32 + line.bytes.len() as u32))
    }

    /// Printable listing: `line  address  bytes  source`.
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        for line in &self.lines {
            let address = line
                .address
                .map(|a| format!("{:04X}", a))
                .unwrap_or_else(|| "    ".to_string());
            let mut rows = line.bytes.chunks(BYTES_PER_ROW);
            let first = rows.next().map(hex_bytes).unwrap_or_default();

            let _ = writeln!(
                out,
                "{:>5}  {}  {:<8}  {}",
                line.line_number, address, first, line.source
            );

            // continuation rows for data and macro lines
            let mut next = line.address.unwrap_or(0).wrapping_add(BYTES_PER_ROW as u16);
            for row in rows {
                let _ = writeln!(out, "{:>5}  {:04X}  {}", "", next, hex_bytes(row));
                next = next.wrapping_add(BYTES_PER_ROW as u16);
            }
        }

        out
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Listing {
        let mut listing = Listing::new();
        listing.push(ListingLine {
            line_number: 1,
            address: Some(0x0200),
            bytes: vec![],
            source: "ORG $0200".into(),
        });
        listing.push(ListingLine {
            line_number: 2,
            address: Some(0x0200),
            bytes: vec![0xA9, 0x55],
            source: "start: LDA #$55".into(),
        });
        listing.push(ListingLine {
            line_number: 3,
            address: Some(0x0202),
            bytes: vec![1, 2, 3, 4],
            source: "DB 1,2,3,4".into(),
        });
        listing
    }

    #[test]
    fn test_text_layout() {
        let text = sample().to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "    2  0200  A9 55     start: LDA #$55");
        assert_eq!(lines[2], "    3  0202  01 02 03  DB 1,2,3,4");
        assert_eq!(lines[3], "       0205  04");
    }

    #[test]
    fn test_address_lookup_ignores_empty_lines() {
        let listing = sample();
        assert_eq!(listing.line_for_address(0x0200).unwrap().line_number, 2);
        assert_eq!(listing.line_for_address(0x0205).unwrap().line_number, 3);
        assert_eq!(listing.address_range(3), Some((0x0202, 0x0206)));
        assert_eq!(listing.address_range(1), None);
    }
}
