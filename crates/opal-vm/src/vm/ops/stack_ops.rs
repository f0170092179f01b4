//! Stack-manipulation handlers
//!
//! Validators only peek; a rejected precondition leaves both stacks
//! exactly as they were. Executors may assume the validator passed but
//! still surface container faults through the same channel.

use crate::error::{VmError, VmResult};
use crate::operand::Operand;
use crate::vm::ExecutionEngine;

// ===== Validators =====

/// Require at least one evaluation stack item
pub(crate) fn need_one(engine: &mut ExecutionEngine) -> VmResult<()> {
    require(engine, 1)
}

/// Require at least two evaluation stack items
pub(crate) fn need_two(engine: &mut ExecutionEngine) -> VmResult<()> {
    require(engine, 2)
}

/// Require at least three evaluation stack items
pub(crate) fn need_three(engine: &mut ExecutionEngine) -> VmResult<()> {
    require(engine, 3)
}

/// Require a decodable index on top plus an item that deep below it
///
/// Shared by PICK, ROLL, and XDROP: the top operand is the index n, and
/// after it is popped the remaining stack must hold more than n items.
pub(crate) fn need_indexed_item(engine: &mut ExecutionEngine) -> VmResult<()> {
    require(engine, 2)?;
    let depth = engine.eval_stack().depth() - 1;
    let index = engine.eval_stack().peek(0)?.as_index()?;
    if index >= depth {
        return Err(VmError::IndexOutOfRange { index, depth });
    }
    Ok(())
}

/// Require at least one alternate stack item
pub(crate) fn need_alt_one(engine: &mut ExecutionEngine) -> VmResult<()> {
    let depth = engine.alt_stack().depth();
    if depth < 1 {
        return Err(VmError::StackUnderflow { needed: 1, depth });
    }
    Ok(())
}

fn require(engine: &mut ExecutionEngine, needed: usize) -> VmResult<()> {
    let depth = engine.eval_stack().depth();
    if depth < needed {
        return Err(VmError::StackUnderflow { needed, depth });
    }
    Ok(())
}

// ===== Executors =====

/// DEPTH: push the evaluation stack depth
pub(crate) fn depth(engine: &mut ExecutionEngine) -> VmResult<()> {
    let depth = engine.eval_stack().depth() as u64;
    engine.eval_stack_mut().push(Operand::from_int(depth))
}

/// DROP: pop and discard the top item
pub(crate) fn drop_top(engine: &mut ExecutionEngine) -> VmResult<()> {
    engine.eval_stack_mut().pop()?;
    Ok(())
}

/// DUP: duplicate the top item
pub(crate) fn dup(engine: &mut ExecutionEngine) -> VmResult<()> {
    let top = engine.eval_stack().peek(0)?.clone();
    engine.eval_stack_mut().push(top)
}

/// NIP: remove the item below the top
pub(crate) fn nip(engine: &mut ExecutionEngine) -> VmResult<()> {
    engine.eval_stack_mut().remove(1)?;
    Ok(())
}

/// OVER: copy the item below the top onto the top
pub(crate) fn over(engine: &mut ExecutionEngine) -> VmResult<()> {
    let item = engine.eval_stack().peek(1)?.clone();
    engine.eval_stack_mut().push(item)
}

/// PICK: pop index n, copy the item n deep onto the top
pub(crate) fn pick(engine: &mut ExecutionEngine) -> VmResult<()> {
    let index = pop_index(engine)?;
    let item = engine.eval_stack().peek(index)?.clone();
    engine.eval_stack_mut().push(item)
}

/// ROLL: pop index n, move the item n deep onto the top
pub(crate) fn roll(engine: &mut ExecutionEngine) -> VmResult<()> {
    let index = pop_index(engine)?;
    if index == 0 {
        return Ok(());
    }
    let item = engine.eval_stack_mut().remove(index)?;
    engine.eval_stack_mut().push(item)
}

/// XDROP: pop index n, remove the item n deep
pub(crate) fn xdrop(engine: &mut ExecutionEngine) -> VmResult<()> {
    let index = pop_index(engine)?;
    engine.eval_stack_mut().remove(index)?;
    Ok(())
}

/// ROT: rotate the third item onto the top
pub(crate) fn rot(engine: &mut ExecutionEngine) -> VmResult<()> {
    let item = engine.eval_stack_mut().remove(2)?;
    engine.eval_stack_mut().push(item)
}

/// SWAP: exchange the top two items
pub(crate) fn swap(engine: &mut ExecutionEngine) -> VmResult<()> {
    let item = engine.eval_stack_mut().remove(1)?;
    engine.eval_stack_mut().push(item)
}

/// TUCK: copy the top item below the second item
pub(crate) fn tuck(engine: &mut ExecutionEngine) -> VmResult<()> {
    let top = engine.eval_stack().peek(0)?.clone();
    engine.eval_stack_mut().insert(2, top)
}

/// TOALTSTACK: move the evaluation stack top to the alternate stack
pub(crate) fn to_alt(engine: &mut ExecutionEngine) -> VmResult<()> {
    let item = engine.eval_stack_mut().pop()?;
    engine.alt_stack_mut().push(item)
}

/// FROMALTSTACK: move the alternate stack top to the evaluation stack
pub(crate) fn from_alt(engine: &mut ExecutionEngine) -> VmResult<()> {
    let item = engine.alt_stack_mut().pop()?;
    engine.eval_stack_mut().push(item)
}

/// DUPFROMALTSTACK: copy the alternate stack top onto the evaluation stack
pub(crate) fn dup_from_alt(engine: &mut ExecutionEngine) -> VmResult<()> {
    let item = engine.alt_stack().peek(0)?.clone();
    engine.eval_stack_mut().push(item)
}

fn pop_index(engine: &mut ExecutionEngine) -> VmResult<usize> {
    engine.eval_stack_mut().pop()?.as_index()
}
