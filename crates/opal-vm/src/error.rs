//! Execution fault taxonomy
//!
//! Every failure raised while executing untrusted bytecode surfaces as a
//! [`VmError`] returned from the engine's single fault channel. Faults are
//! ordinary expected outcomes, never panics.

use thiserror::Error;

/// Result alias for engine and handler operations
pub type VmResult<T> = Result<T, VmError>;

/// Execution fault
///
/// Raised by the engine, the operand stacks, or an opcode handler. The
/// first fault during a step moves the engine to [`VmState::Fault`] and is
/// returned to the caller unchanged.
///
/// [`VmState::Fault`]: crate::vm::VmState::Fault
#[derive(Debug, Error)]
pub enum VmError {
    /// Opcode byte outside the inline-push band with no dispatch entry
    #[error("unsupported opcode 0x{opcode:02X} at offset {offset}")]
    UnsupportedOpcode { opcode: u8, offset: usize },

    /// Cursor ran past the end of the current script
    #[error("read past end of script at offset {offset}: wanted {wanted} byte(s), {available} available")]
    EndOfScript {
        offset: usize,
        wanted: usize,
        available: usize,
    },

    /// Operand stack had fewer items than an operation required
    #[error("operand stack underflow: needed {needed} item(s), have {depth}")]
    StackUnderflow { needed: usize, depth: usize },

    /// Top-relative stack index outside the current depth
    #[error("operand stack index {index} out of range (depth {depth})")]
    IndexOutOfRange { index: usize, depth: usize },

    /// Operand stack reached its configured depth limit
    #[error("operand stack overflow: limit of {limit} items reached")]
    StackOverflow { limit: usize },

    /// Context stack reached its configured depth limit
    #[error("call depth limit of {limit} contexts reached")]
    CallDepthExceeded { limit: usize },

    /// Branch target outside the current script
    #[error("jump target {target} outside script of {len} byte(s)")]
    InvalidJumpTarget { target: i64, len: usize },

    /// Pushed operand larger than the configured item size limit
    #[error("operand of {size} byte(s) exceeds item size limit {limit}")]
    OversizedOperand { size: usize, limit: usize },

    /// Operand consumed as a stack index does not encode one
    #[error("operand does not encode a stack index")]
    InvalidIndexOperand,

    /// Engine asked to execute with an empty context stack
    #[error("no execution context")]
    NoContext,

    /// Failure from outside the recognized taxonomy, original cause kept
    #[error("execution fault: {0}")]
    Traced(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl VmError {
    /// Wrap an arbitrary failure cause into the fault channel
    ///
    /// The original cause stays reachable through [`std::error::Error::source`]
    /// for diagnostics.
    pub fn traced(cause: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        VmError::Traced(cause.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_carries_context() {
        let err = VmError::UnsupportedOpcode {
            opcode: 0xEE,
            offset: 7,
        };
        assert_eq!(err.to_string(), "unsupported opcode 0xEE at offset 7");

        let err = VmError::EndOfScript {
            offset: 3,
            wanted: 4,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "read past end of script at offset 3: wanted 4 byte(s), 1 available"
        );
    }

    #[test]
    fn test_traced_preserves_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = VmError::traced(cause);
        assert!(err.to_string().contains("boom"));
        assert!(err.source().is_some());
    }
}
