//! Opcode dispatch table
//!
//! Uses a static lookup table for O(1) opcode resolution instead of
//! match-based dispatch, reducing branch mispredictions in the hot loop.
//! The table is built at compile time and shared read-only by every
//! engine instance; it never changes at runtime.
//!
//! The inline-push band (0x01..=0x4B) has no entries: the engine
//! resolves it before consulting the table.

use crate::bytecode::opcode;
use crate::error::VmError;

use super::ops;
use super::ExecutionEngine;

/// Handler function: validator or executor
pub type HandlerFn = fn(&mut ExecutionEngine) -> Result<(), VmError>;

/// Dispatch entry for one opcode
///
/// The validator (if any) runs first and must be free of side effects on
/// the failure path; the executor (if any) performs the opcode's effect.
#[derive(Debug, Clone, Copy)]
pub struct OpHandler {
    /// Precondition check, run before the executor
    pub validator: Option<HandlerFn>,
    /// The opcode's effect
    pub exec: Option<HandlerFn>,
}

const fn exec_only(exec: HandlerFn) -> Option<OpHandler> {
    Some(OpHandler {
        validator: None,
        exec: Some(exec),
    })
}

const fn validated(validator: HandlerFn, exec: HandlerFn) -> Option<OpHandler> {
    Some(OpHandler {
        validator: Some(validator),
        exec: Some(exec),
    })
}

/// Static dispatch table mapping opcode bytes to handler records.
/// Indexed by the raw u8 opcode byte for O(1) lookup.
static HANDLER_TABLE: [Option<OpHandler>; 256] = {
    let mut table: [Option<OpHandler>; 256] = [None; 256];

    // Constants
    table[opcode::PUSH0 as usize] = exec_only(ops::push0);
    table[opcode::PUSHDATA1 as usize] = exec_only(ops::pushdata1);
    table[opcode::PUSHDATA2 as usize] = exec_only(ops::pushdata2);
    table[opcode::PUSHDATA4 as usize] = exec_only(ops::pushdata4);
    let mut op = opcode::PUSH1;
    while op <= opcode::PUSH16 {
        table[op as usize] = exec_only(ops::push_small_int);
        op += 1;
    }

    // Control flow
    table[opcode::NOP as usize] = exec_only(ops::flow::nop);
    table[opcode::JMP as usize] = exec_only(ops::flow::jmp);
    table[opcode::JMPIF as usize] = validated(ops::stack_ops::need_one, ops::flow::jmpif);
    table[opcode::JMPIFNOT as usize] = validated(ops::stack_ops::need_one, ops::flow::jmpifnot);
    table[opcode::CALL as usize] = validated(ops::flow::validate_call, ops::flow::call);
    table[opcode::RET as usize] = exec_only(ops::flow::ret);

    // Alternate stack
    table[opcode::DUPFROMALTSTACK as usize] =
        validated(ops::stack_ops::need_alt_one, ops::stack_ops::dup_from_alt);
    table[opcode::TOALTSTACK as usize] =
        validated(ops::stack_ops::need_one, ops::stack_ops::to_alt);
    table[opcode::FROMALTSTACK as usize] =
        validated(ops::stack_ops::need_alt_one, ops::stack_ops::from_alt);
    table[opcode::XDROP as usize] =
        validated(ops::stack_ops::need_indexed_item, ops::stack_ops::xdrop);

    // Stack manipulation
    table[opcode::DEPTH as usize] = exec_only(ops::stack_ops::depth);
    table[opcode::DROP as usize] = validated(ops::stack_ops::need_one, ops::stack_ops::drop_top);
    table[opcode::DUP as usize] = validated(ops::stack_ops::need_one, ops::stack_ops::dup);
    table[opcode::NIP as usize] = validated(ops::stack_ops::need_two, ops::stack_ops::nip);
    table[opcode::OVER as usize] = validated(ops::stack_ops::need_two, ops::stack_ops::over);
    table[opcode::PICK as usize] =
        validated(ops::stack_ops::need_indexed_item, ops::stack_ops::pick);
    table[opcode::ROLL as usize] =
        validated(ops::stack_ops::need_indexed_item, ops::stack_ops::roll);
    table[opcode::ROT as usize] = validated(ops::stack_ops::need_three, ops::stack_ops::rot);
    table[opcode::SWAP as usize] = validated(ops::stack_ops::need_two, ops::stack_ops::swap);
    table[opcode::TUCK as usize] = validated(ops::stack_ops::need_two, ops::stack_ops::tuck);

    // Special
    table[opcode::HALT as usize] = exec_only(ops::flow::halt);

    table
};

/// Resolve an opcode byte against the dispatch table.
/// Returns None for bytes with no handler record.
#[inline(always)]
pub fn lookup(opcode: u8) -> Option<&'static OpHandler> {
    HANDLER_TABLE[opcode as usize].as_ref()
}
