//! Engine integration tests
//!
//! Drives whole scripts through the dispatch loop and checks lifecycle
//! transitions, fault propagation, and operand stack effects.

use opal_vm::{opcode, ExecutionEngine, Limits, Script, ScriptBuilder, VmError, VmState};
use pretty_assertions::assert_eq;
use rstest::rstest;

// ============================================================================
// Canonical helpers
// ============================================================================

fn engine_for(bytes: &[u8]) -> ExecutionEngine {
    let mut engine = ExecutionEngine::new();
    engine.load_script(Script::new(bytes.to_vec()));
    engine
}

fn engine_with_limits(bytes: &[u8], limits: Limits) -> ExecutionEngine {
    let mut engine = ExecutionEngine::with_limits(limits);
    engine.load_script(Script::new(bytes.to_vec()));
    engine
}

/// Evaluation stack contents, bottom to top, as raw bytes
fn eval_stack_bytes(engine: &ExecutionEngine) -> Vec<Vec<u8>> {
    engine
        .eval_stack()
        .iter()
        .map(|operand| operand.as_bytes().to_vec())
        .collect()
}

// ============================================================================
// Opcode resolution and faults
// ============================================================================

#[test]
fn test_unsupported_opcode_faults() {
    let mut engine = engine_for(&[0xEE]);
    let err = engine.run().unwrap_err();
    assert!(matches!(
        err,
        VmError::UnsupportedOpcode {
            opcode: 0xEE,
            offset: 0
        }
    ));
    assert_eq!(engine.state(), VmState::Fault);
}

#[test]
fn test_inline_push_reads_exact_bytes() {
    // 0x03 means "push the next 3 raw bytes as one operand"
    let mut engine = engine_for(&[0x03, 0xAA, 0xBB, 0xCC]);
    engine.step().unwrap();

    assert_eq!(eval_stack_bytes(&engine), vec![vec![0xAA, 0xBB, 0xCC]]);
    assert_eq!(engine.state(), VmState::Running);
    assert_eq!(engine.current_context().unwrap().position(), 4);
    // The fast path never consults the dispatch table
    assert!(engine.current_handler().is_none());
}

#[test]
fn test_inline_push_covers_whole_band() {
    for n in 1..=75u8 {
        let mut bytes = vec![n];
        bytes.extend(std::iter::repeat(0x11).take(n as usize));
        let mut engine = engine_for(&bytes);
        engine.step().unwrap();

        assert_eq!(engine.state(), VmState::Running, "opcode 0x{:02X}", n);
        assert_eq!(engine.eval_stack().depth(), 1);
        assert_eq!(engine.eval_stack().peek(0).unwrap().len(), n as usize);
    }
}

#[test]
fn test_truncated_inline_push_faults() {
    let mut engine = engine_for(&[0x03, 0xAA]);
    let err = engine.run().unwrap_err();
    assert!(matches!(
        err,
        VmError::EndOfScript {
            offset: 1,
            wanted: 3,
            available: 1
        }
    ));
    assert_eq!(engine.state(), VmState::Fault);
}

#[test]
fn test_running_off_script_end_faults() {
    // A script that neither returns nor halts runs off its end
    let mut engine = engine_for(&[opcode::NOP]);
    assert!(matches!(
        engine.run().unwrap_err(),
        VmError::EndOfScript { offset: 1, .. }
    ));
    assert_eq!(engine.state(), VmState::Fault);
}

#[test]
fn test_pushdata_length_prefixes() {
    let payload = vec![0x42; 300];
    let mut builder = ScriptBuilder::new();
    builder.emit_push(&payload); // 300 bytes selects PUSHDATA2
    builder.emit(opcode::HALT);
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.build());

    engine.run().unwrap();
    assert_eq!(engine.state(), VmState::Halt);
    assert_eq!(eval_stack_bytes(&engine), vec![payload]);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_fault_is_sticky() {
    let mut engine = engine_for(&[0xEE, opcode::NOP]);
    assert!(engine.run().is_err());
    assert_eq!(engine.state(), VmState::Fault);

    // A faulted engine never executes again: no error, no effect
    assert!(engine.run().is_ok());
    assert!(engine.step().is_ok());
    assert_eq!(engine.state(), VmState::Fault);
    assert!(engine.eval_stack().is_empty());
}

#[test]
fn test_halt_keeps_context() {
    let mut engine = engine_for(&[opcode::HALT]);
    engine.run().unwrap();
    assert_eq!(engine.state(), VmState::Halt);
    assert_eq!(engine.context_depth(), 1);
}

#[test]
fn test_drained_contexts_complete_run() {
    // RET on the entry context empties the context stack: normal completion
    let mut engine = engine_for(&[opcode::RET]);
    engine.run().unwrap();
    assert_eq!(engine.state(), VmState::Done);
    assert_eq!(engine.context_depth(), 0);
}

#[test]
fn test_run_clears_pending_break() {
    let mut engine = engine_for(&[opcode::NOP, opcode::NOP, opcode::HALT]);
    engine.request_break();
    assert_eq!(engine.state(), VmState::Break);

    // The pause must not re-terminate the run before any opcode executes
    engine.run().unwrap();
    assert_eq!(engine.state(), VmState::Halt);
}

#[test]
fn test_single_stepping_while_paused() {
    let mut engine = engine_for(&[opcode::NOP, opcode::HALT]);
    engine.request_break();

    engine.step().unwrap();
    assert_eq!(engine.state(), VmState::Break);
    assert_eq!(engine.current_context().unwrap().position(), 1);

    engine.step().unwrap();
    assert_eq!(engine.state(), VmState::Halt);
}

// ============================================================================
// Validators (side-effect-free failure path)
// ============================================================================

#[test]
fn test_validator_failure_leaves_stacks_untouched() {
    let mut builder = ScriptBuilder::new();
    builder.emit_push(&[0xAA]);
    builder.emit(opcode::SWAP); // needs two operands, only one present
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.build());

    let err = engine.run().unwrap_err();
    assert!(matches!(
        err,
        VmError::StackUnderflow {
            needed: 2,
            depth: 1
        }
    ));
    assert_eq!(engine.state(), VmState::Fault);
    assert_eq!(eval_stack_bytes(&engine), vec![vec![0xAA]]);
}

#[test]
fn test_index_validator_rejects_out_of_range() {
    let mut builder = ScriptBuilder::new();
    builder.emit_push(&[0xAA]);
    builder.emit_push(&[0x05]); // index 5 into a single-item stack
    builder.emit(opcode::PICK);
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.build());

    let err = engine.run().unwrap_err();
    assert!(matches!(
        err,
        VmError::IndexOutOfRange { index: 5, depth: 1 }
    ));
    // Validator peeked but popped nothing
    assert_eq!(
        eval_stack_bytes(&engine),
        vec![vec![0xAA], vec![0x05]]
    );
}

// ============================================================================
// Stack manipulation
// ============================================================================

#[rstest]
#[case::dup(vec![vec![0xAA]], vec![opcode::DUP], vec![vec![0xAA], vec![0xAA]])]
#[case::drop(vec![vec![0xAA], vec![0xBB]], vec![opcode::DROP], vec![vec![0xAA]])]
#[case::swap(vec![vec![0xAA], vec![0xBB]], vec![opcode::SWAP], vec![vec![0xBB], vec![0xAA]])]
#[case::nip(vec![vec![0xAA], vec![0xBB]], vec![opcode::NIP], vec![vec![0xBB]])]
#[case::over(vec![vec![0xAA], vec![0xBB]], vec![opcode::OVER], vec![vec![0xAA], vec![0xBB], vec![0xAA]])]
#[case::rot(vec![vec![0xAA], vec![0xBB], vec![0xCC]], vec![opcode::ROT], vec![vec![0xBB], vec![0xCC], vec![0xAA]])]
#[case::tuck(vec![vec![0xAA], vec![0xBB]], vec![opcode::TUCK], vec![vec![0xBB], vec![0xAA], vec![0xBB]])]
#[case::depth(vec![vec![0xAA], vec![0xBB]], vec![opcode::DEPTH], vec![vec![0xAA], vec![0xBB], vec![0x02]])]
#[case::pick(vec![vec![0xAA], vec![0xBB], vec![0xCC], vec![0x02]], vec![opcode::PICK], vec![vec![0xAA], vec![0xBB], vec![0xCC], vec![0xAA]])]
#[case::roll(vec![vec![0xAA], vec![0xBB], vec![0xCC], vec![0x02]], vec![opcode::ROLL], vec![vec![0xBB], vec![0xCC], vec![0xAA]])]
#[case::xdrop(vec![vec![0xAA], vec![0xBB], vec![0xCC], vec![0x02]], vec![opcode::XDROP], vec![vec![0xBB], vec![0xCC]])]
fn test_stack_manipulation(
    #[case] pushes: Vec<Vec<u8>>,
    #[case] ops: Vec<u8>,
    #[case] expected: Vec<Vec<u8>>,
) {
    let mut builder = ScriptBuilder::new();
    for data in &pushes {
        builder.emit_push(data);
    }
    for &op in &ops {
        builder.emit(op);
    }
    builder.emit(opcode::HALT);
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.build());

    engine.run().unwrap();
    assert_eq!(engine.state(), VmState::Halt);
    assert_eq!(eval_stack_bytes(&engine), expected);
}

#[test]
fn test_push_small_ints() {
    let mut engine = engine_for(&[opcode::PUSH0, opcode::PUSH1, 0x60, opcode::HALT]);
    engine.run().unwrap();
    assert_eq!(
        eval_stack_bytes(&engine),
        vec![vec![], vec![0x01], vec![0x10]]
    );
}

#[test]
fn test_alt_stack_transfers() {
    let mut builder = ScriptBuilder::new();
    builder.emit_push(&[0xAA]);
    builder.emit(opcode::TOALTSTACK);
    builder.emit_push(&[0xBB]);
    builder.emit(opcode::DUPFROMALTSTACK);
    builder.emit(opcode::FROMALTSTACK);
    builder.emit(opcode::HALT);
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.build());

    engine.run().unwrap();
    assert_eq!(
        eval_stack_bytes(&engine),
        vec![vec![0xBB], vec![0xAA], vec![0xAA]]
    );
    assert!(engine.alt_stack().is_empty());
}

#[test]
fn test_alt_stack_underflow_faults() {
    let mut engine = engine_for(&[opcode::FROMALTSTACK]);
    assert!(matches!(
        engine.run().unwrap_err(),
        VmError::StackUnderflow { needed: 1, depth: 0 }
    ));
    assert_eq!(engine.state(), VmState::Fault);
}

// ============================================================================
// Branches and calls
// ============================================================================

#[test]
fn test_jmp_skips_instructions() {
    // 0000  JMP +5 -> 0005
    // 0003  PUSHBYTES1 0xAA   (skipped)
    // 0005  HALT
    let mut builder = ScriptBuilder::new();
    builder.emit_branch(opcode::JMP, 5);
    builder.emit_push(&[0xAA]);
    builder.emit(opcode::HALT);
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.build());

    engine.run().unwrap();
    assert_eq!(engine.state(), VmState::Halt);
    assert!(engine.eval_stack().is_empty());
}

#[rstest]
#[case::taken(0x01, vec![])]
#[case::not_taken(0x00, vec![vec![0xAA]])]
fn test_jmpif_consumes_condition(#[case] condition: u8, #[case] expected: Vec<Vec<u8>>) {
    // 0000  PUSHBYTES1 <condition>
    // 0002  JMPIF +5 -> 0007
    // 0005  PUSHBYTES1 0xAA   (executed only when not taken)
    // 0007  HALT
    let mut builder = ScriptBuilder::new();
    builder.emit_push(&[condition]);
    builder.emit_branch(opcode::JMPIF, 5);
    builder.emit_push(&[0xAA]);
    builder.emit(opcode::HALT);
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.build());

    engine.run().unwrap();
    assert_eq!(engine.state(), VmState::Halt);
    assert_eq!(eval_stack_bytes(&engine), expected);
}

#[test]
fn test_invalid_jump_target_faults() {
    let mut builder = ScriptBuilder::new();
    builder.emit_branch(opcode::JMP, -5);
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.build());

    assert!(matches!(
        engine.run().unwrap_err(),
        VmError::InvalidJumpTarget { target: -5, .. }
    ));
    assert_eq!(engine.state(), VmState::Fault);
}

#[test]
fn test_call_and_return_balance() {
    // 0000  PUSHBYTES1 0xAA
    // 0002  CALL +4 -> 0006
    // 0005  HALT
    // 0006  PUSHBYTES1 0xBB   (callee)
    // 0008  DROP
    // 0009  RET
    let mut builder = ScriptBuilder::new();
    builder.emit_push(&[0xAA]);
    builder.emit_branch(opcode::CALL, 4);
    builder.emit(opcode::HALT);
    builder.emit_push(&[0xBB]);
    builder.emit(opcode::DROP);
    builder.emit(opcode::RET);
    let script = builder.build();

    let mut engine = ExecutionEngine::new();
    engine.load_script(script.clone());

    engine.step().unwrap(); // push 0xAA
    engine.step().unwrap(); // CALL
    assert_eq!(engine.context_depth(), 2);
    assert_eq!(engine.current_context().unwrap().position(), 6);
    // The callee sees its caller's operands: stacks are engine-owned
    assert_eq!(eval_stack_bytes(&engine), vec![vec![0xAA]]);

    engine.step().unwrap(); // push 0xBB
    engine.step().unwrap(); // DROP
    engine.step().unwrap(); // RET
    assert_eq!(engine.context_depth(), 1);
    assert_eq!(engine.current_context().unwrap().position(), 5);
    assert_eq!(
        engine.current_context().unwrap().script().as_bytes(),
        script.as_bytes()
    );
    // Balanced call left the operand count unchanged
    assert_eq!(eval_stack_bytes(&engine), vec![vec![0xAA]]);

    engine.step().unwrap(); // HALT
    assert_eq!(engine.state(), VmState::Halt);
}

#[test]
fn test_nested_calls_unwind_in_order() {
    // 0000  CALL +4 -> 0004
    // 0003  HALT
    // 0004  CALL +4 -> 0008
    // 0007  RET
    // 0008  RET
    let mut builder = ScriptBuilder::new();
    builder.emit_branch(opcode::CALL, 4);
    builder.emit(opcode::HALT);
    builder.emit_branch(opcode::CALL, 4);
    builder.emit(opcode::RET);
    builder.emit(opcode::RET);
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.build());

    engine.step().unwrap();
    engine.step().unwrap();
    assert_eq!(engine.context_depth(), 3);

    engine.run().unwrap();
    assert_eq!(engine.state(), VmState::Halt);
    assert_eq!(engine.context_depth(), 1);
}

// ============================================================================
// Limits
// ============================================================================

#[test]
fn test_stack_depth_limit() {
    let limits = Limits {
        max_stack_depth: 2,
        ..Limits::default()
    };
    let mut engine = engine_with_limits(
        &[opcode::PUSH1, opcode::PUSH1, opcode::PUSH1, opcode::HALT],
        limits,
    );

    assert!(matches!(
        engine.run().unwrap_err(),
        VmError::StackOverflow { limit: 2 }
    ));
    assert_eq!(engine.state(), VmState::Fault);
    assert_eq!(engine.eval_stack().depth(), 2);
}

#[test]
fn test_call_depth_limit() {
    let limits = Limits {
        max_call_depth: 1,
        ..Limits::default()
    };
    let mut builder = ScriptBuilder::new();
    builder.emit_branch(opcode::CALL, 3);
    builder.emit(opcode::RET);
    let mut engine = ExecutionEngine::with_limits(limits);
    engine.load_script(builder.build());

    assert!(matches!(
        engine.run().unwrap_err(),
        VmError::CallDepthExceeded { limit: 1 }
    ));
    assert_eq!(engine.state(), VmState::Fault);
    assert_eq!(engine.context_depth(), 1);
}

#[test]
fn test_item_size_limit() {
    let limits = Limits {
        max_item_size: 2,
        ..Limits::default()
    };
    let mut engine = engine_with_limits(&[0x03, 0xAA, 0xBB, 0xCC, opcode::HALT], limits);

    assert!(matches!(
        engine.run().unwrap_err(),
        VmError::OversizedOperand { size: 3, limit: 2 }
    ));
    assert_eq!(engine.state(), VmState::Fault);
    assert!(engine.eval_stack().is_empty());
}

// ============================================================================
// Profiling
// ============================================================================

#[test]
fn test_profiler_counts_steps() {
    let mut engine = ExecutionEngine::with_profiling();
    engine.load_script(Script::new(vec![opcode::NOP, opcode::NOP, opcode::HALT]));

    engine.run().unwrap();
    let profiler = engine.profiler().unwrap();
    assert_eq!(profiler.total_steps(), 3);
    assert_eq!(profiler.step_count(opcode::NOP), 2);
    assert_eq!(profiler.step_count(opcode::HALT), 1);
}
