//! Opcode handlers
//!
//! Each handler receives the engine as its sole argument and signals
//! failure through the engine's fault channel. Validators check
//! preconditions without mutating anything; executors perform the effect.

pub(crate) mod flow;
pub(crate) mod stack_ops;

use crate::bytecode::opcode;
use crate::error::{VmError, VmResult};
use crate::operand::Operand;

use super::ExecutionEngine;

/// Push raw bytes onto the evaluation stack as a single operand
///
/// The inline-push fast path and every PUSHDATA handler funnel through
/// here; the item size limit is enforced at this boundary.
pub(crate) fn push_data(engine: &mut ExecutionEngine, data: Vec<u8>) -> VmResult<()> {
    let limit = engine.limits().max_item_size;
    if data.len() > limit {
        return Err(VmError::OversizedOperand {
            size: data.len(),
            limit,
        });
    }
    engine.eval_stack_mut().push(Operand::from(data))
}

/// PUSH0: push the empty operand
pub(crate) fn push0(engine: &mut ExecutionEngine) -> VmResult<()> {
    push_data(engine, Vec::new())
}

/// PUSH1..PUSH16: push the small integer encoded in the opcode byte
pub(crate) fn push_small_int(engine: &mut ExecutionEngine) -> VmResult<()> {
    let value = engine.op_code() - opcode::PUSH1 + 1;
    push_data(engine, vec![value])
}

/// PUSHDATA1: u8 length prefix, then payload
pub(crate) fn pushdata1(engine: &mut ExecutionEngine) -> VmResult<()> {
    let len = engine.context_mut()?.read_byte()? as usize;
    read_and_push(engine, len)
}

/// PUSHDATA2: little-endian u16 length prefix, then payload
pub(crate) fn pushdata2(engine: &mut ExecutionEngine) -> VmResult<()> {
    let len = engine.context_mut()?.read_u16_le()? as usize;
    read_and_push(engine, len)
}

/// PUSHDATA4: little-endian u32 length prefix, then payload
pub(crate) fn pushdata4(engine: &mut ExecutionEngine) -> VmResult<()> {
    let len = engine.context_mut()?.read_u32_le()? as usize;
    read_and_push(engine, len)
}

fn read_and_push(engine: &mut ExecutionEngine, len: usize) -> VmResult<()> {
    let limit = engine.limits().max_item_size;
    if len > limit {
        return Err(VmError::OversizedOperand { size: len, limit });
    }
    let data = engine.context_mut()?.read_bytes(len)?;
    push_data(engine, data)
}
