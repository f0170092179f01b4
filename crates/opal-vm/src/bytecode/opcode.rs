//! Opcode byte values
//!
//! One byte per instruction, with explicit values so scripts serialize
//! stably across releases. The band `0x01..=0x4B` is reserved: each byte N
//! in it means "push the next N raw bytes as one operand" and is resolved
//! by the engine without a dispatch entry.

// ===== Constants (0x00-0x60) =====
/// Push the empty operand
pub const PUSH0: u8 = 0x00;
/// First byte of the inline-push band (push next 1 byte)
pub const PUSHBYTES1: u8 = 0x01;
/// Last byte of the inline-push band (push next 75 bytes)
pub const PUSHBYTES75: u8 = 0x4B;
/// Push operand with u8 length prefix
pub const PUSHDATA1: u8 = 0x4C;
/// Push operand with little-endian u16 length prefix
pub const PUSHDATA2: u8 = 0x4D;
/// Push operand with little-endian u32 length prefix
pub const PUSHDATA4: u8 = 0x4E;
/// Push the one-byte integer 1
pub const PUSH1: u8 = 0x51;
/// Push the one-byte integer 16; bytes 0x51-0x60 cover 1 through 16
pub const PUSH16: u8 = 0x60;

// ===== Control flow (0x61-0x66) =====
/// No effect
pub const NOP: u8 = 0x61;
/// Unconditional branch [i16 offset]
pub const JMP: u8 = 0x62;
/// Pop condition, branch if true [i16 offset]
pub const JMPIF: u8 = 0x63;
/// Pop condition, branch if false [i16 offset]
pub const JMPIFNOT: u8 = 0x64;
/// Fork the current script into a new context at the target [i16 offset]
pub const CALL: u8 = 0x65;
/// Pop the current context
pub const RET: u8 = 0x66;

// ===== Alternate stack (0x6A-0x6D) =====
/// Copy the alternate stack top onto the evaluation stack
pub const DUPFROMALTSTACK: u8 = 0x6A;
/// Move the evaluation stack top to the alternate stack
pub const TOALTSTACK: u8 = 0x6B;
/// Move the alternate stack top to the evaluation stack
pub const FROMALTSTACK: u8 = 0x6C;
/// Pop index n, remove the item n deep
pub const XDROP: u8 = 0x6D;

// ===== Stack manipulation (0x74-0x7D) =====
/// Push the current evaluation stack depth
pub const DEPTH: u8 = 0x74;
/// Pop and discard the top item
pub const DROP: u8 = 0x75;
/// Duplicate the top item
pub const DUP: u8 = 0x76;
/// Remove the item below the top
pub const NIP: u8 = 0x77;
/// Copy the item below the top onto the top
pub const OVER: u8 = 0x78;
/// Pop index n, copy the item n deep onto the top
pub const PICK: u8 = 0x79;
/// Pop index n, move the item n deep onto the top
pub const ROLL: u8 = 0x7A;
/// Rotate the top three items
pub const ROT: u8 = 0x7B;
/// Swap the top two items
pub const SWAP: u8 = 0x7C;
/// Copy the top item below the second item
pub const TUCK: u8 = 0x7D;

// ===== Special =====
/// Signal successful termination
pub const HALT: u8 = 0xFF;

/// Whether a byte falls in the reserved inline-push band
#[inline(always)]
pub fn is_inline_push(opcode: u8) -> bool {
    (PUSHBYTES1..=PUSHBYTES75).contains(&opcode)
}

/// Mnemonic for a dispatchable opcode byte
///
/// Returns `None` for unassigned bytes and for the inline-push band, whose
/// mnemonics carry the byte count and are rendered by the disassembler.
pub fn name(opcode: u8) -> Option<&'static str> {
    let name = match opcode {
        PUSH0 => "PUSH0",
        PUSHDATA1 => "PUSHDATA1",
        PUSHDATA2 => "PUSHDATA2",
        PUSHDATA4 => "PUSHDATA4",
        0x51 => "PUSH1",
        0x52 => "PUSH2",
        0x53 => "PUSH3",
        0x54 => "PUSH4",
        0x55 => "PUSH5",
        0x56 => "PUSH6",
        0x57 => "PUSH7",
        0x58 => "PUSH8",
        0x59 => "PUSH9",
        0x5A => "PUSH10",
        0x5B => "PUSH11",
        0x5C => "PUSH12",
        0x5D => "PUSH13",
        0x5E => "PUSH14",
        0x5F => "PUSH15",
        PUSH16 => "PUSH16",
        NOP => "NOP",
        JMP => "JMP",
        JMPIF => "JMPIF",
        JMPIFNOT => "JMPIFNOT",
        CALL => "CALL",
        RET => "RET",
        DUPFROMALTSTACK => "DUPFROMALTSTACK",
        TOALTSTACK => "TOALTSTACK",
        FROMALTSTACK => "FROMALTSTACK",
        XDROP => "XDROP",
        DEPTH => "DEPTH",
        DROP => "DROP",
        DUP => "DUP",
        NIP => "NIP",
        OVER => "OVER",
        PICK => "PICK",
        ROLL => "ROLL",
        ROT => "ROT",
        SWAP => "SWAP",
        TUCK => "TUCK",
        HALT => "HALT",
        _ => return None,
    };
    Some(name)
}
