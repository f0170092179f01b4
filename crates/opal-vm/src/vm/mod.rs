//! Stack-based execution engine
//!
//! Drives the opcode fetch/validate/execute cycle over a call stack of
//! execution contexts. Two operand stacks (evaluation + alternate) are
//! owned by the engine and shared across every nested context: a called
//! script sees and may mutate values pushed by its caller.
//!
//! Single-threaded, synchronous, non-reentrant. Execution is strictly in
//! program order and every misbehaving instruction faults the engine
//! immediately; every validating node must reach the same result.

mod context;
pub mod dispatch;
mod ops;
mod profiler;
mod stack;
mod state;

pub use context::ExecutionContext;
pub use dispatch::{HandlerFn, OpHandler};
pub use profiler::Profiler;
pub use stack::RandomAccessStack;
pub use state::VmState;

use crate::bytecode::{opcode, Script};
use crate::error::{VmError, VmResult};
use crate::limits::Limits;
use crate::operand::Operand;

/// Bytecode execution engine
///
/// Owns the context call stack, both operand stacks, and the lifecycle
/// state. Opcode handlers receive `&mut ExecutionEngine` and use the
/// accessors here as their sole mutation surface.
pub struct ExecutionEngine {
    /// Evaluation stack, shared across all contexts
    eval_stack: RandomAccessStack<Operand>,
    /// Alternate stack, shared across all contexts
    alt_stack: RandomAccessStack<Operand>,
    /// Context call stack; the last entry is current
    contexts: Vec<ExecutionContext>,
    /// Lifecycle state
    state: VmState,
    /// Opcode fetched by the current step
    op_code: u8,
    /// Handler resolved for the current step, if the dispatch table was
    /// consulted
    handler: Option<&'static OpHandler>,
    /// Execution limits, fixed at construction
    limits: Limits,
    /// Optional profiler for execution analysis
    profiler: Option<Profiler>,
}

impl ExecutionEngine {
    /// Create an engine with default limits and no loaded script
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Create an engine with explicit limits
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            eval_stack: RandomAccessStack::new(limits.max_stack_depth),
            alt_stack: RandomAccessStack::new(limits.max_stack_depth),
            contexts: Vec::new(),
            state: VmState::Running,
            op_code: opcode::NOP,
            handler: None,
            limits,
            profiler: None,
        }
    }

    /// Create an engine with profiling enabled
    pub fn with_profiling() -> Self {
        let mut engine = Self::new();
        engine.profiler = Some(Profiler::enabled());
        engine
    }

    /// Activate a script as the entry context
    pub fn load_script(&mut self, script: Script) {
        self.push_context(ExecutionContext::new(script));
    }

    // ===== Lifecycle =====

    /// Current lifecycle state
    pub fn state(&self) -> VmState {
        self.state
    }

    /// Transition the lifecycle state
    ///
    /// Fault and Halt are sticky: once the engine is in either, every
    /// further transition is ignored.
    pub fn set_state(&mut self, state: VmState) {
        if !self.state.is_terminal() {
            self.state = state;
        }
    }

    /// Ask the engine to pause after the current step
    ///
    /// External steppers use this to interleave single steps with other
    /// work; the next `run` clears the pause and resumes.
    pub fn request_break(&mut self) {
        self.set_state(VmState::Break);
    }

    fn clear_break(&mut self) {
        if self.state == VmState::Break {
            self.state = VmState::Running;
        }
    }

    // ===== Contexts =====

    /// The current (top) context, if any
    pub fn current_context(&self) -> Option<&ExecutionContext> {
        self.contexts.last()
    }

    /// Mutable access to the current context
    ///
    /// Handlers read operands through this; an empty context stack is a
    /// fault, not a panic.
    pub fn context_mut(&mut self) -> VmResult<&mut ExecutionContext> {
        self.contexts.last_mut().ok_or(VmError::NoContext)
    }

    /// Number of active contexts
    pub fn context_depth(&self) -> usize {
        self.contexts.len()
    }

    /// Activate a context; it becomes current
    pub fn push_context(&mut self, context: ExecutionContext) {
        self.contexts.push(context);
    }

    /// Remove the current context
    ///
    /// If contexts remain, the new top becomes current and the lifecycle
    /// state is untouched. Removing the last context moves the engine to
    /// [`VmState::Done`]: every invoked script has returned.
    pub fn pop_context(&mut self) -> Option<ExecutionContext> {
        let popped = self.contexts.pop();
        if self.contexts.is_empty() {
            self.set_state(VmState::Done);
        }
        popped
    }

    // ===== Handler surface =====

    /// Evaluation stack
    pub fn eval_stack(&self) -> &RandomAccessStack<Operand> {
        &self.eval_stack
    }

    /// Mutable evaluation stack
    pub fn eval_stack_mut(&mut self) -> &mut RandomAccessStack<Operand> {
        &mut self.eval_stack
    }

    /// Alternate stack
    pub fn alt_stack(&self) -> &RandomAccessStack<Operand> {
        &self.alt_stack
    }

    /// Mutable alternate stack
    pub fn alt_stack_mut(&mut self) -> &mut RandomAccessStack<Operand> {
        &mut self.alt_stack
    }

    /// Opcode byte fetched by the current step
    pub fn op_code(&self) -> u8 {
        self.op_code
    }

    /// Handler resolved for the current step
    ///
    /// `None` until the first dispatch-table resolution, and for steps
    /// served by the inline-push fast path.
    pub fn current_handler(&self) -> Option<&'static OpHandler> {
        self.handler
    }

    /// Execution limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    // ===== Profiling =====

    /// Enable profiling
    pub fn enable_profiling(&mut self) {
        match self.profiler {
            Some(ref mut profiler) => profiler.enable(),
            None => self.profiler = Some(Profiler::enabled()),
        }
    }

    /// Disable profiling
    pub fn disable_profiling(&mut self) {
        if let Some(ref mut profiler) = self.profiler {
            profiler.disable();
        }
    }

    /// Get profiler reference
    pub fn profiler(&self) -> Option<&Profiler> {
        self.profiler.as_ref()
    }

    /// Get mutable profiler reference
    pub fn profiler_mut(&mut self) -> Option<&mut Profiler> {
        self.profiler.as_mut()
    }

    // ===== Execution =====

    /// Begin or resume stepping
    ///
    /// Clears a pending Break first, so a prior pause never prevents the
    /// next opcode from executing. Steps until the state stops the loop:
    /// `Fault`, `Halt`, `Break`, or `Done`. Returns the first error
    /// encountered; a clean pause, halt, or drained context stack returns
    /// `Ok(())`.
    pub fn run(&mut self) -> VmResult<()> {
        self.clear_break();
        if self.contexts.is_empty() {
            self.set_state(VmState::Done);
        }
        loop {
            if self.state.stops_run() {
                return Ok(());
            }
            self.step()?;
        }
    }

    /// Execute exactly one opcode
    ///
    /// Fetches from the current context's cursor, resolves against the
    /// dispatch table (or the inline-push band), then runs the validator
    /// and executor. Any failure moves the engine to `Fault` and is
    /// returned as the error. Once the engine is in a sticky terminal
    /// state, stepping is a no-op: nothing after a fault has an
    /// observable effect.
    pub fn step(&mut self) -> VmResult<()> {
        if self.state.is_terminal() {
            return Ok(());
        }
        match self.execute_op() {
            Ok(()) => Ok(()),
            Err(err) => {
                self.set_state(VmState::Fault);
                Err(err)
            }
        }
    }

    fn execute_op(&mut self) -> VmResult<()> {
        self.handler = None;
        let ctx = self.contexts.last_mut().ok_or(VmError::NoContext)?;
        let offset = ctx.position();
        let op = ctx.read_byte()?;
        self.op_code = op;

        if let Some(ref mut profiler) = self.profiler {
            if profiler.is_enabled() {
                profiler.record_step(op);
            }
        }

        // Inline-push fast path: the opcode byte is the length of a raw
        // literal that follows it. Bypasses the dispatch table.
        if opcode::is_inline_push(op) {
            let data = self.context_mut()?.read_bytes(op as usize)?;
            return ops::push_data(self, data);
        }

        let handler = dispatch::lookup(op).ok_or(VmError::UnsupportedOpcode {
            opcode: op,
            offset,
        })?;
        self.handler = Some(handler);

        if let Some(validator) = handler.validator {
            validator(self)?;
        }
        if let Some(exec) = handler.exec {
            exec(self)?;
        }
        Ok(())
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}
