//! Built-in data macros
//!
//! All of these return raw bytes. Handlers that may reference labels emit a
//! placeholder of the right size in pass 1 when a label is not known yet, so
//! the expansion size is identical in both passes.

use std::f64::consts::PI;

use super::macros::{MacroContext, MacroOutput, MacroRegistry};

pub(crate) fn register_all(registry: &mut MacroRegistry) {
    registry.register("text_string", text_string);
    registry.register("pascal_string", pascal_string);
    registry.register("byte_table", byte_table);
    registry.register("word_table", word_table);
    registry.register("jump_table", jump_table);
    registry.register("repeat_byte", repeat_byte);
    registry.register("raw_hex", raw_hex);
    registry.register("sine_table", sine_table);
    registry.register("cosine_table", cosine_table);
}

/// Parses `$hex`, `0xhex`, `%binary`, `@octal` or decimal, with optional sign.
fn parse_number(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let value = if let Some(hex) = digits.strip_prefix('$') {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix('%') {
        i64::from_str_radix(bin, 2).ok()?
    } else if let Some(oct) = digits.strip_prefix('@') {
        i64::from_str_radix(oct, 8).ok()?
    } else {
        digits.parse().ok()?
    };

    Some(if negative { -value } else { value })
}

fn parse_byte(text: &str) -> Result<u8, String> {
    let value = parse_number(text).ok_or_else(|| format!("cannot parse byte value: {}", text))?;
    u8::try_from(value).map_err(|_| format!("byte value out of range: {}", text))
}

/// Resolves a label or number; unknown labels are 0 in pass 1.
fn resolve_address(arg: &str, context: &MacroContext<'_>, pass: u8) -> Result<i64, String> {
    if let Some(symbol) = context.labels.lookup_symbol(arg) {
        return Ok(symbol.address as i64);
    }
    if let Some(value) = parse_number(arg) {
        return Ok(value);
    }
    if pass == 1 && arg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Ok(0);
    }
    Err(format!("cannot resolve label: {}", arg))
}

/// Strips matching quotes and applies `\n \r \t \\` escapes (plus `\0` when
/// `allow_nul`).
fn unquote(arg: &str, allow_nul: bool) -> Vec<u8> {
    let quoted = arg.len() >= 2
        && ((arg.starts_with('"') && arg.ends_with('"'))
            || (arg.starts_with('\'') && arg.ends_with('\'')));
    let text = if quoted { &arg[1..arg.len() - 1] } else { arg };

    let mut bytes = Vec::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let escaped = match chars.peek() {
                Some('n') => Some(b'\n'),
                Some('r') => Some(b'\r'),
                Some('t') => Some(b'\t'),
                Some('\\') => Some(b'\\'),
                Some('0') if allow_nul => Some(0),
                _ => None,
            };
            if let Some(byte) = escaped {
                chars.next();
                bytes.push(byte);
                continue;
            }
        }
        let mut buf = [0u8; 4];
        bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    }
    bytes
}

fn first_arg<'a>(args: &'a [String], name: &str) -> Result<&'a str, String> {
    args.first()
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires an argument", name))
}

/// `@text_string "hello"`: string bytes followed by a zero terminator.
pub fn text_string(args: &[String], _: &MacroContext<'_>, _: u8) -> Result<MacroOutput, String> {
    let mut bytes = unquote(first_arg(args, "text_string")?, true);
    bytes.push(0);
    Ok(MacroOutput::Bytes(bytes))
}

/// `@pascal_string "hello"`: length byte followed by the string bytes.
pub fn pascal_string(args: &[String], _: &MacroContext<'_>, _: u8) -> Result<MacroOutput, String> {
    let text = unquote(first_arg(args, "pascal_string")?, false);
    let length =
        u8::try_from(text.len()).map_err(|_| format!("string too long ({} bytes)", text.len()))?;
    let mut bytes = vec![length];
    bytes.extend(text);
    Ok(MacroOutput::Bytes(bytes))
}

pub fn byte_table(args: &[String], _: &MacroContext<'_>, _: u8) -> Result<MacroOutput, String> {
    first_arg(args, "byte_table")?;
    let bytes = args
        .iter()
        .map(|arg| parse_byte(arg))
        .collect::<Result<Vec<u8>, String>>()?;
    Ok(MacroOutput::Bytes(bytes))
}

/// Little-endian words; arguments may be labels.
pub fn word_table(args: &[String], context: &MacroContext<'_>, pass: u8) -> Result<MacroOutput, String> {
    first_arg(args, "word_table")?;
    let mut bytes = Vec::with_capacity(args.len() * 2);
    for arg in args {
        let value = resolve_address(arg, context, pass)?;
        bytes.push(value as u8);
        bytes.push((value >> 8) as u8);
    }
    Ok(MacroOutput::Bytes(bytes))
}

/// RTS dispatch table: each entry is `address - 1`, little-endian.
pub fn jump_table(args: &[String], context: &MacroContext<'_>, pass: u8) -> Result<MacroOutput, String> {
    first_arg(args, "jump_table")?;
    let mut bytes = Vec::with_capacity(args.len() * 2);
    for arg in args {
        let address = resolve_address(arg, context, pass)? - 1;
        bytes.push(address as u8);
        bytes.push((address >> 8) as u8);
    }
    Ok(MacroOutput::Bytes(bytes))
}

/// `@repeat_byte value, count`
pub fn repeat_byte(args: &[String], _: &MacroContext<'_>, _: u8) -> Result<MacroOutput, String> {
    let [value, count] = args else {
        return Err("repeat_byte requires value and count".to_string());
    };
    let value = parse_byte(value)?;
    let count = parse_number(count)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| format!("invalid repeat count: {}", count))?;
    Ok(MacroOutput::Bytes(vec![value; count]))
}

/// `@raw_hex $A9, 55`: bytes given in hex, with or without `$`.
pub fn raw_hex(args: &[String], _: &MacroContext<'_>, _: u8) -> Result<MacroOutput, String> {
    first_arg(args, "raw_hex")?;
    let bytes = args
        .iter()
        .map(|arg| {
            let digits = arg.strip_prefix('$').unwrap_or(arg);
            u8::from_str_radix(digits, 16).map_err(|_| format!("invalid hex byte: {}", arg))
        })
        .collect::<Result<Vec<u8>, String>>()?;
    Ok(MacroOutput::Bytes(bytes))
}

fn wave_table(args: &[String], wave: fn(f64) -> f64) -> Result<MacroOutput, String> {
    let count = match args.first() {
        Some(arg) => parse_number(arg)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| format!("invalid table size: {}", arg))?,
        None => 256,
    };
    let bytes = (0..count)
        .map(|i| {
            let angle = i as f64 / count as f64 * 2.0 * PI;
            ((wave(angle) + 1.0) * 127.5) as i64 as u8
        })
        .collect();
    Ok(MacroOutput::Bytes(bytes))
}

/// `count` samples of one sine period scaled to 0..=255 (default 256).
pub fn sine_table(args: &[String], _: &MacroContext<'_>, _: u8) -> Result<MacroOutput, String> {
    wave_table(args, f64::sin)
}

pub fn cosine_table(args: &[String], _: &MacroContext<'_>, _: u8) -> Result<MacroOutput, String> {
    wave_table(args, f64::cos)
}
