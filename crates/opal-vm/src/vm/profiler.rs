//! Engine profiling and instrumentation
//!
//! Provides optional profiling capabilities for execution analysis.
//! Profiling is disabled by default and has zero overhead when not enabled.

use std::collections::HashMap;

use crate::bytecode::opcode;

/// Execution profiler
///
/// Tracks per-opcode execution counts across steps. Disabled by default
/// for production validation runs.
#[derive(Debug, Clone)]
pub struct Profiler {
    /// Whether profiling is enabled
    enabled: bool,
    /// Total steps executed
    total_steps: u64,
    /// Steps executed per opcode byte
    step_counts: HashMap<u8, u64>,
}

impl Profiler {
    /// Create a new profiler (disabled by default)
    pub fn new() -> Self {
        Self {
            enabled: false,
            total_steps: 0,
            step_counts: HashMap::new(),
        }
    }

    /// Create a new profiler with profiling enabled
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::new()
        }
    }

    /// Enable profiling
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disable profiling
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Check if profiling is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Reset profiling statistics
    pub fn reset(&mut self) {
        self.total_steps = 0;
        self.step_counts.clear();
    }

    /// Record one executed step
    ///
    /// Called by the engine for each fetched opcode when profiling is
    /// enabled; checked at the engine level so the disabled path stays free.
    pub fn record_step(&mut self, opcode: u8) {
        if !self.enabled {
            return;
        }
        self.total_steps += 1;
        *self.step_counts.entry(opcode).or_insert(0) += 1;
    }

    /// Total steps executed
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Step count for a specific opcode byte
    pub fn step_count(&self, opcode: u8) -> u64 {
        self.step_counts.get(&opcode).copied().unwrap_or(0)
    }

    /// Generate a profiling report
    ///
    /// Returns a formatted string with execution statistics, most frequent
    /// opcode first.
    pub fn report(&self) -> String {
        if !self.enabled {
            return "Profiling not enabled".to_string();
        }

        let mut report = format!("Total steps executed: {}\n\n", self.total_steps);

        if self.step_counts.is_empty() {
            report.push_str("No steps recorded\n");
            return report;
        }

        report.push_str("Step counts by opcode:\n");

        let mut counts: Vec<_> = self.step_counts.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

        for (byte, count) in counts {
            let mnemonic = match opcode::name(*byte) {
                Some(name) => name.to_string(),
                None if opcode::is_inline_push(*byte) => format!("PUSHBYTES{}", byte),
                None => format!("Unknown(0x{:02x})", byte),
            };
            let percentage = (*count as f64 / self.total_steps as f64) * 100.0;
            report.push_str(&format!(
                "  {:<18} {:>10} ({:>6.2}%)\n",
                mnemonic, count, percentage
            ));
        }

        report
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}
