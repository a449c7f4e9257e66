//! Error types for breakwater-core
//!
//! Every failure a sandboxed call can produce is one of these kinds; a fault
//! inside user code never propagates as a panic or an untyped error of the
//! host process.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BreakwaterError {
    /// The snippet was rejected by the pre-flight validator. No process
    /// was spawned.
    #[error("validation error: {0}")]
    Validation(String),

    /// The child process exceeded its wall-clock budget and was killed.
    #[error("execution timed out after {elapsed_secs} seconds")]
    Timeout { elapsed_secs: u64 },

    /// The snippet raised an uncaught fault inside the sandbox; the message
    /// carries the formatted trace captured by the wrapper.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The child produced output that does not match the framed-JSON
    /// contract.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The interpreter binary for the requested language is not installed.
    #[error("runtime not found: {runtime}")]
    RuntimeMissing { runtime: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl BreakwaterError {
    /// Short stable name of the error kind, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Timeout { .. } => "timeout",
            Self::Runtime(_) => "runtime",
            Self::Protocol(_) => "protocol",
            Self::RuntimeMissing { .. } => "runtime_missing",
            Self::Io(_) => "io",
            Self::Serialize(_) => "serialize",
            Self::Config(_) => "config",
        }
    }
}
