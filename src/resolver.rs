//! # Addressing Mode Resolver
//!
//! Turns a parsed operand shape into a concrete addressing mode (encode
//! direction) and answers the inverse question for the disassembler: does a
//! decoded instruction need explicit syntax to re-encode to the same opcode?
//!
//! The resolver owns two rules shared by every component:
//!
//! - **Zero-page collapse**: a direct operand whose value fits in one byte uses
//!   the zero-page form when the mnemonic has one, unless the operand carries
//!   the `.a` force-absolute suffix. An operand whose value is not yet known
//!   (forward reference) widens to the absolute form so sizes never shrink
//!   between passes.
//! - **Relative branches**: offsets are `target - (instruction_address + 2)`,
//!   taken modulo $10000 the way the CPU adds them, and must fit in a signed
//!   byte.

use std::fmt;

use crate::addressing::AddressingMode;
use crate::opcodes::{is_branch, is_known_mnemonic, lookup_by_mnemonic, OpcodeMetadata};

/// Index register named in an operand (`,X` or `,Y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexRegister {
    X,
    Y,
}

/// Syntactic shape of an operand, as written in source.
///
/// The shape alone decides everything except the zero-page/absolute choice,
/// which also depends on the operand value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandSyntax {
    /// No operand at all (`CLC`, `ASL`)
    None,
    /// Literal `A` (`ASL A`)
    Accumulator,
    /// `#expr`
    Immediate,
    /// `expr`, `expr,X` or `expr,Y`, optionally with the `.a` suffix
    Direct {
        index: Option<IndexRegister>,
        force_absolute: bool,
    },
    /// `(expr)`
    Indirect,
    /// `(expr,X)`
    IndirectX,
    /// `(expr),Y`
    IndirectY,
}

impl fmt::Display for OperandSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandSyntax::None => write!(f, "implied"),
            OperandSyntax::Accumulator => write!(f, "accumulator"),
            OperandSyntax::Immediate => write!(f, "immediate"),
            OperandSyntax::Direct { index, force_absolute } => {
                let base = if *force_absolute { "absolute" } else { "direct" };
                match index {
                    None => write!(f, "{}", base),
                    Some(IndexRegister::X) => write!(f, "{},X", base),
                    Some(IndexRegister::Y) => write!(f, "{},Y", base),
                }
            }
            OperandSyntax::Indirect => write!(f, "indirect"),
            OperandSyntax::IndirectX => write!(f, "(indirect,X)"),
            OperandSyntax::IndirectY => write!(f, "(indirect),Y"),
        }
    }
}

/// Reasons an operand cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown mnemonic '{0}'")]
    UnknownMnemonic(String),

    #[error("{mnemonic} does not support {syntax} addressing")]
    UnsupportedSyntax {
        mnemonic: String,
        syntax: OperandSyntax,
    },

    #[error("branch target out of range (offset {offset}, must be -128..=127)")]
    BranchOutOfRange { offset: i32 },
}

/// Resolve a mnemonic and operand shape to a table entry.
///
/// `value` is the operand's numeric value when already known. `None` means a
/// forward reference, which never collapses to zero page.
///
/// # Examples
///
/// ```
/// use tool6502::resolver::{resolve, OperandSyntax};
/// use tool6502::AddressingMode;
///
/// let direct = OperandSyntax::Direct { index: None, force_absolute: false };
/// assert_eq!(resolve("LDA", direct, Some(0x10)).unwrap().addressing_mode, AddressingMode::ZeroPage);
/// assert_eq!(resolve("LDA", direct, Some(0x1234)).unwrap().addressing_mode, AddressingMode::Absolute);
/// assert_eq!(resolve("LDA", direct, None).unwrap().addressing_mode, AddressingMode::Absolute);
///
/// let forced = OperandSyntax::Direct { index: None, force_absolute: true };
/// assert_eq!(resolve("STA", forced, Some(0x00)).unwrap().opcode, 0x8D);
/// ```
pub fn resolve(
    mnemonic: &str,
    syntax: OperandSyntax,
    value: Option<u16>,
) -> Result<&'static OpcodeMetadata, ResolveError> {
    if !is_known_mnemonic(mnemonic) {
        return Err(ResolveError::UnknownMnemonic(mnemonic.to_string()));
    }

    let unsupported = || ResolveError::UnsupportedSyntax {
        mnemonic: mnemonic.to_ascii_uppercase(),
        syntax,
    };

    // Branches take a plain target expression; the encoded byte is an offset
    if is_branch(mnemonic) {
        return match syntax {
            OperandSyntax::Direct {
                index: None,
                force_absolute: false,
            } => lookup_by_mnemonic(mnemonic, AddressingMode::Relative).ok_or_else(unsupported),
            _ => Err(unsupported()),
        };
    }

    let mode = match syntax {
        OperandSyntax::None => AddressingMode::Implied,
        OperandSyntax::Accumulator => AddressingMode::Accumulator,
        OperandSyntax::Immediate => AddressingMode::Immediate,
        OperandSyntax::Indirect => AddressingMode::Indirect,
        OperandSyntax::IndirectX => AddressingMode::IndirectX,
        OperandSyntax::IndirectY => AddressingMode::IndirectY,
        OperandSyntax::Direct {
            index,
            force_absolute,
        } => return resolve_direct(mnemonic, index, force_absolute, value).ok_or_else(unsupported),
    };

    lookup_by_mnemonic(mnemonic, mode).ok_or_else(unsupported)
}

fn resolve_direct(
    mnemonic: &str,
    index: Option<IndexRegister>,
    force_absolute: bool,
    value: Option<u16>,
) -> Option<&'static OpcodeMetadata> {
    let absolute = match index {
        None => AddressingMode::Absolute,
        Some(IndexRegister::X) => AddressingMode::AbsoluteX,
        Some(IndexRegister::Y) => AddressingMode::AbsoluteY,
    };
    let zero_page = absolute.zero_page_form()?;

    if force_absolute {
        return lookup_by_mnemonic(mnemonic, absolute);
    }

    let fits = value.is_some_and(|v| v <= 0xFF);
    if fits {
        if let Some(metadata) = lookup_by_mnemonic(mnemonic, zero_page) {
            return Some(metadata);
        }
    }

    // Unknown values widen; a mnemonic with only a zero-page form (STX zp,Y)
    // keeps it and the encoder range-checks the final value.
    lookup_by_mnemonic(mnemonic, absolute).or_else(|| lookup_by_mnemonic(mnemonic, zero_page))
}

/// Whether re-encoding this instruction from plain text would pick a
/// different opcode, so the text must carry the `.a` suffix.
///
/// True exactly when an absolute-mode operand fits in one byte and the
/// mnemonic also has the matching zero-page form.
pub fn needs_force_absolute(metadata: &OpcodeMetadata, operand: u16) -> bool {
    match metadata.addressing_mode.zero_page_form() {
        Some(zero_page) if operand <= 0xFF => {
            lookup_by_mnemonic(metadata.mnemonic, zero_page).is_some()
        }
        _ => false,
    }
}

/// Compute the signed displacement stored in a branch instruction.
///
/// ```
/// use tool6502::resolver::branch_offset;
///
/// assert_eq!(branch_offset(0x0200, 0x0281).unwrap(), 127);
/// assert_eq!(branch_offset(0x0200, 0x0182).unwrap(), -128);
/// assert!(branch_offset(0x0200, 0x0282).is_err());
/// // wraps around the top of memory
/// assert_eq!(branch_offset(0xFFF0, 0x0002).unwrap(), 0x10);
/// ```
pub fn branch_offset(instruction_address: u16, target: u16) -> Result<i8, ResolveError> {
    let offset = target.wrapping_sub(instruction_address.wrapping_add(2)) as i16;
    i8::try_from(offset).map_err(|_| ResolveError::BranchOutOfRange {
        offset: offset as i32,
    })
}

/// Address a branch at `instruction_address` transfers to when taken.
pub fn branch_target(instruction_address: u16, offset: i8) -> u16 {
    instruction_address
        .wrapping_add(2)
        .wrapping_add_signed(offset as i16)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECT: OperandSyntax = OperandSyntax::Direct {
        index: None,
        force_absolute: false,
    };

    #[test]
    fn test_zero_page_collapse() {
        assert_eq!(resolve("LDA", DIRECT, Some(0xFF)).unwrap().opcode, 0xA5);
        assert_eq!(resolve("LDA", DIRECT, Some(0x100)).unwrap().opcode, 0xAD);
    }

    #[test]
    fn test_jmp_has_no_zero_page_form() {
        assert_eq!(resolve("JMP", DIRECT, Some(0x10)).unwrap().opcode, 0x4C);
        assert_eq!(resolve("JSR", DIRECT, Some(0x10)).unwrap().opcode, 0x20);
    }

    #[test]
    fn test_indexed_y_falls_back_to_absolute() {
        // LDA has no zp,Y form
        let syntax = OperandSyntax::Direct {
            index: Some(IndexRegister::Y),
            force_absolute: false,
        };
        assert_eq!(resolve("LDA", syntax, Some(0x10)).unwrap().opcode, 0xB9);
        assert_eq!(resolve("LDX", syntax, Some(0x10)).unwrap().opcode, 0xB6);
        // STX only has zp,Y
        assert_eq!(resolve("STX", syntax, None).unwrap().opcode, 0x96);
    }

    #[test]
    fn test_force_absolute_without_absolute_form_fails() {
        let syntax = OperandSyntax::Direct {
            index: Some(IndexRegister::Y),
            force_absolute: true,
        };
        assert!(matches!(
            resolve("STX", syntax, Some(0x10)),
            Err(ResolveError::UnsupportedSyntax { .. })
        ));
    }

    #[test]
    fn test_accumulator_both_spellings() {
        let implicit = resolve("lsr", OperandSyntax::None, None).unwrap();
        let explicit = resolve("LSR", OperandSyntax::Accumulator, None).unwrap();
        assert_eq!(implicit.opcode, 0x4A);
        assert_eq!(explicit.opcode, 0x4A);
    }

    #[test]
    fn test_branch_requires_plain_target() {
        assert_eq!(resolve("BNE", DIRECT, None).unwrap().addressing_mode, AddressingMode::Relative);
        assert!(resolve("BNE", OperandSyntax::Immediate, None).is_err());
    }

    #[test]
    fn test_unknown_mnemonic() {
        assert_eq!(
            resolve("FOO", OperandSyntax::None, None),
            Err(ResolveError::UnknownMnemonic("FOO".to_string()))
        );
    }

    #[test]
    fn test_branch_offset_boundaries() {
        assert_eq!(branch_offset(0x1000, 0x1002).unwrap(), 0);
        assert_eq!(branch_offset(0x1000, 0x1081).unwrap(), 127);
        assert_eq!(branch_offset(0x1000, 0x0F82).unwrap(), -128);
        assert_eq!(
            branch_offset(0x1000, 0x1082),
            Err(ResolveError::BranchOutOfRange { offset: 128 })
        );
        assert_eq!(
            branch_offset(0x1000, 0x0F81),
            Err(ResolveError::BranchOutOfRange { offset: -129 })
        );
    }

    #[test]
    fn test_branch_offset_wraps_address_space() {
        assert_eq!(branch_offset(0xFFF0, 0x0002).unwrap(), 0x10);
        assert_eq!(branch_offset(0xFFFE, 0x0000).unwrap(), 0);
        assert_eq!(branch_offset(0x0010, 0xFFF0).unwrap(), -0x22);
        assert_eq!(
            branch_offset(0x0010, 0xF000),
            Err(ResolveError::BranchOutOfRange { offset: -0x1012 })
        );
        for offset in [-128i8, -1, 0, 1, 127] {
            for address in [0x0000u16, 0x007F, 0xFF80, 0xFFFE, 0xFFFF] {
                let target = branch_target(address, offset);
                assert_eq!(branch_offset(address, target), Ok(offset));
            }
        }
    }

    #[test]
    fn test_branch_target_inverse() {
        assert_eq!(branch_target(0x1000, 127), 0x1081);
        assert_eq!(branch_target(0x1000, -128), 0x0F82);
        assert_eq!(branch_target(0x1000, -2), 0x1000);
    }

    #[test]
    fn test_needs_force_absolute() {
        let sta_abs = crate::opcodes::lookup_by_opcode(0x8D).unwrap();
        assert!(needs_force_absolute(sta_abs, 0x0010));
        assert!(!needs_force_absolute(sta_abs, 0x0110));
        let jmp = crate::opcodes::lookup_by_opcode(0x4C).unwrap();
        assert!(!needs_force_absolute(jmp, 0x0010));
        let lda_abs_y = crate::opcodes::lookup_by_opcode(0xB9).unwrap();
        assert!(!needs_force_absolute(lda_abs_y, 0x0010));
    }
}
