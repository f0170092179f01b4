//! Control-flow handlers
//!
//! Branch operands are little-endian i16 offsets relative to the position
//! of the branch opcode itself: `target = branch position + operand`.

use crate::error::{VmError, VmResult};
use crate::vm::{ExecutionEngine, VmState};

/// Size in bytes of a branch instruction (opcode + i16 operand)
const BRANCH_SIZE: i64 = 3;

/// NOP: no effect
pub(crate) fn nop(_engine: &mut ExecutionEngine) -> VmResult<()> {
    Ok(())
}

/// JMP: unconditional branch
pub(crate) fn jmp(engine: &mut ExecutionEngine) -> VmResult<()> {
    let target = branch_target(engine)?;
    engine.context_mut()?.jump(target)
}

/// JMPIF: pop condition, branch when true
pub(crate) fn jmpif(engine: &mut ExecutionEngine) -> VmResult<()> {
    conditional_jump(engine, true)
}

/// JMPIFNOT: pop condition, branch when false
pub(crate) fn jmpifnot(engine: &mut ExecutionEngine) -> VmResult<()> {
    conditional_jump(engine, false)
}

/// CALL validator: refuse to exceed the context depth limit
pub(crate) fn validate_call(engine: &mut ExecutionEngine) -> VmResult<()> {
    let limit = engine.limits().max_call_depth;
    if engine.context_depth() >= limit {
        return Err(VmError::CallDepthExceeded { limit });
    }
    Ok(())
}

/// CALL: fork the current script into a new context at the branch target
///
/// The caller's cursor already sits past the operand, so it resumes at the
/// next instruction when the callee returns.
pub(crate) fn call(engine: &mut ExecutionEngine) -> VmResult<()> {
    let target = branch_target(engine)?;
    let callee = engine.context_mut()?.fork_at(target)?;
    engine.push_context(callee);
    Ok(())
}

/// RET: pop the current context
///
/// Popping the last context drains the engine; the run loop then stops
/// with the no-more-work state.
pub(crate) fn ret(engine: &mut ExecutionEngine) -> VmResult<()> {
    engine.pop_context();
    Ok(())
}

/// HALT: signal successful termination
pub(crate) fn halt(engine: &mut ExecutionEngine) -> VmResult<()> {
    engine.set_state(VmState::Halt);
    Ok(())
}

/// Read the i16 operand and resolve it against the branch's own offset
fn branch_target(engine: &mut ExecutionEngine) -> VmResult<i64> {
    let ctx = engine.context_mut()?;
    let offset = i64::from(ctx.read_i16_le()?);
    let base = ctx.position() as i64 - BRANCH_SIZE;
    Ok(base + offset)
}

fn conditional_jump(engine: &mut ExecutionEngine, jump_when: bool) -> VmResult<()> {
    let target = branch_target(engine)?;
    let condition = engine.eval_stack_mut().pop()?.is_truthy();
    if condition == jump_when {
        engine.context_mut()?.jump(target)?;
    }
    Ok(())
}
