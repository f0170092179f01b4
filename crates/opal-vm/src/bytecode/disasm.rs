//! Script disassembler
//!
//! Renders a script as offset/mnemonic/operand lines for debugging and
//! post-mortem inspection of faulted executions. Unknown bytes and
//! truncated operands render as placeholders rather than errors.

use std::fmt::Write;

use super::{opcode, Script};

/// Disassemble a whole script
///
/// # Format
/// ```text
/// 0000  PUSHBYTES3 0xaabbcc
/// 0004  JMP +5 -> 0009
/// 0007  DROP
/// 0008  <invalid opcode: 0xee>
/// ```
pub fn disassemble(script: &Script) -> String {
    let mut output = String::new();
    let mut offset = 0;
    while offset < script.len() {
        let line = disassemble_instruction(script, &mut offset);
        writeln!(output, "{}", line).unwrap();
    }
    output
}

/// Disassemble one instruction, advancing `offset` past it
fn disassemble_instruction(script: &Script, offset: &mut usize) -> String {
    let bytes = script.as_bytes();
    let start = *offset;
    let byte = bytes[start];
    *offset += 1;

    if opcode::is_inline_push(byte) {
        let wanted = byte as usize;
        return match take(bytes, offset, wanted) {
            Some(data) => format!("{:04}  PUSHBYTES{} {}", start, wanted, hex(data)),
            None => format!("{:04}  <truncated PUSHBYTES{}>", start, wanted),
        };
    }

    match byte {
        opcode::PUSHDATA1 => {
            let Some(len) = take(bytes, offset, 1).map(|b| b[0] as usize) else {
                return format!("{:04}  <truncated PUSHDATA1>", start);
            };
            match take(bytes, offset, len) {
                Some(data) => format!("{:04}  PUSHDATA1 {}", start, hex(data)),
                None => format!("{:04}  <truncated PUSHDATA1>", start),
            }
        }
        opcode::PUSHDATA2 => {
            let Some(len) =
                take(bytes, offset, 2).map(|b| u16::from_le_bytes([b[0], b[1]]) as usize)
            else {
                return format!("{:04}  <truncated PUSHDATA2>", start);
            };
            match take(bytes, offset, len) {
                Some(data) => format!("{:04}  PUSHDATA2 {}", start, hex(data)),
                None => format!("{:04}  <truncated PUSHDATA2>", start),
            }
        }
        opcode::PUSHDATA4 => {
            let Some(len) = take(bytes, offset, 4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize)
            else {
                return format!("{:04}  <truncated PUSHDATA4>", start);
            };
            match take(bytes, offset, len) {
                Some(data) => format!("{:04}  PUSHDATA4 {}", start, hex(data)),
                None => format!("{:04}  <truncated PUSHDATA4>", start),
            }
        }
        opcode::JMP | opcode::JMPIF | opcode::JMPIFNOT | opcode::CALL => {
            let mnemonic = opcode::name(byte).unwrap_or("?");
            match take(bytes, offset, 2) {
                Some(operand) => {
                    let rel = i16::from_le_bytes([operand[0], operand[1]]);
                    let target = start as i64 + i64::from(rel);
                    format!("{:04}  {} {:+} -> {:04}", start, mnemonic, rel, target)
                }
                None => format!("{:04}  <truncated {}>", start, mnemonic),
            }
        }
        _ => match opcode::name(byte) {
            Some(mnemonic) => format!("{:04}  {}", start, mnemonic),
            None => format!("{:04}  <invalid opcode: 0x{:02x}>", start, byte),
        },
    }
}

/// Take `count` bytes from the stream, or `None` (consuming the rest) if
/// the script is truncated
fn take<'a>(bytes: &'a [u8], offset: &mut usize, count: usize) -> Option<&'a [u8]> {
    if *offset + count > bytes.len() {
        *offset = bytes.len();
        return None;
    }
    let slice = &bytes[*offset..*offset + count];
    *offset += count;
    Some(slice)
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for byte in bytes {
        write!(out, "{:02x}", byte).unwrap();
    }
    out
}
