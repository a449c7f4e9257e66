//! Execution result types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Result of a sandboxed code execution
///
/// When `success` is false exactly one of `output` (meaningful) or `error`
/// (non-null) holds. `stdout` carries only text the snippet itself printed;
/// protocol framing never leaks into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the snippet ran to completion
    pub success: bool,

    /// Value of the snippet's result variable, if any
    pub output: Option<Value>,

    /// Human-readable failure description, if any
    pub error: Option<String>,

    /// Text the snippet printed to standard output
    pub stdout: String,

    /// Wall-clock duration of the whole call
    pub duration: Duration,
}

impl ExecutionResult {
    /// Successful result with the given output value.
    #[must_use]
    pub fn ok(output: Option<Value>, stdout: String, duration: Duration) -> Self {
        Self {
            success: true,
            output,
            error: None,
            stdout,
            duration,
        }
    }

    /// Failed result with the given error message.
    #[must_use]
    pub fn failed(error: impl Into<String>, stdout: String, duration: Duration) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            stdout,
            duration,
        }
    }
}
