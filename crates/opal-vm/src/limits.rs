//! Execution limits
//!
//! Bounds enforced while running untrusted bytecode. Every validating node
//! must run with identical limits to reach identical results, so limits are
//! plain data that deployments load from configuration.

use serde::{Deserialize, Serialize};

fn default_max_stack_depth() -> usize {
    2048
}

fn default_max_call_depth() -> usize {
    1024
}

fn default_max_item_size() -> usize {
    1024 * 1024
}

/// Execution limits for an engine instance
///
/// Fixed at engine construction. Enforcement points:
/// - `max_stack_depth` caps each operand stack (overflow fault on push)
/// - `max_call_depth` caps the context stack (checked by the CALL validator)
/// - `max_item_size` caps a single pushed operand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum items on each operand stack
    #[serde(default = "default_max_stack_depth")]
    pub max_stack_depth: usize,
    /// Maximum simultaneously active execution contexts
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    /// Maximum size in bytes of a single operand
    #[serde(default = "default_max_item_size")]
    pub max_item_size: usize,
}

impl Limits {
    /// Parse limits from a TOML document
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_stack_depth: default_max_stack_depth(),
            max_call_depth: default_max_call_depth(),
            max_item_size: default_max_item_size(),
        }
    }
}
