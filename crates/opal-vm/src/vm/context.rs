//! Execution context
//!
//! One activated script frame: the script's bytecode plus a read cursor.
//! Created when a script (top-level or called) begins executing, destroyed
//! when it returns. Owned exclusively by one engine's context stack.
//!
//! All reads advance the cursor and are bounds-checked; running past the
//! end of the buffer is an ordinary fault, not a panic.

use crate::bytecode::Script;
use crate::error::{VmError, VmResult};

/// One activated script frame
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    script: Script,
    ip: usize,
}

impl ExecutionContext {
    /// Activate a script at its first byte
    pub fn new(script: Script) -> Self {
        Self { script, ip: 0 }
    }

    /// The script this context executes
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Current cursor position
    pub fn position(&self) -> usize {
        self.ip
    }

    /// Bytes left between the cursor and the end of the script
    pub fn remaining(&self) -> usize {
        self.script.len() - self.ip
    }

    /// Read one byte, advancing the cursor
    pub fn read_byte(&mut self) -> VmResult<u8> {
        if self.ip >= self.script.len() {
            return Err(VmError::EndOfScript {
                offset: self.ip,
                wanted: 1,
                available: 0,
            });
        }
        let byte = self.script.as_bytes()[self.ip];
        self.ip += 1;
        Ok(byte)
    }

    /// Read `count` bytes, advancing the cursor
    pub fn read_bytes(&mut self, count: usize) -> VmResult<Vec<u8>> {
        let available = self.remaining();
        if count > available {
            return Err(VmError::EndOfScript {
                offset: self.ip,
                wanted: count,
                available,
            });
        }
        let bytes = self.script.as_bytes()[self.ip..self.ip + count].to_vec();
        self.ip += count;
        Ok(bytes)
    }

    /// Read a little-endian u16, advancing the cursor
    pub fn read_u16_le(&mut self) -> VmResult<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a little-endian i16, advancing the cursor
    pub fn read_i16_le(&mut self) -> VmResult<i16> {
        let bytes = self.read_bytes(2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a little-endian u32, advancing the cursor
    pub fn read_u32_le(&mut self) -> VmResult<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Move the cursor to an absolute position
    ///
    /// A target equal to the script length is allowed; the next fetch then
    /// faults with end-of-script.
    pub fn jump(&mut self, target: i64) -> VmResult<()> {
        self.ip = self.checked_position(target)?;
        Ok(())
    }

    /// Fork this context's script into a fresh context at `target`
    ///
    /// Used by call-style handlers: the new context shares the script
    /// allocation and gets its own cursor.
    pub fn fork_at(&self, target: i64) -> VmResult<Self> {
        Ok(Self {
            script: self.script.clone(),
            ip: self.checked_position(target)?,
        })
    }

    fn checked_position(&self, target: i64) -> VmResult<usize> {
        let len = self.script.len();
        if target < 0 || target as usize > len {
            return Err(VmError::InvalidJumpTarget { target, len });
        }
        Ok(target as usize)
    }
}
