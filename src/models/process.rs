//! External tool invocation results

use chrono::{DateTime, Local};

/// Outcome of one external tool invocation, immutable once returned
#[derive(Debug, Clone)]
pub struct OperationResult {
    pub success: bool,
    /// Captured stdout/stderr lines, each stream in arrival order
    pub output: Vec<String>,
    pub finished_at: DateTime<Local>,
}

impl OperationResult {
    /// A failed result carrying a single descriptive line.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: vec![message.into()],
            finished_at: Local::now(),
        }
    }
}
