//! Execution orchestrator
//!
//! Public entry point of the engine: selects the sandbox for the requested
//! language, runs the validate → wrap → spawn → decode pipeline, and applies
//! the caller's failure policy.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::config::SandboxConfig;
use crate::protocol;
use crate::request::CodeRequest;
use crate::result::ExecutionResult;
use crate::sandbox::{JavaScriptSandbox, PythonSandbox, Sandbox};
use crate::{BreakwaterError, Result};

/// What a failed execution does to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Propagate every failure as a typed error (the default).
    #[default]
    FailFast,
    /// Fold the error text into a degraded string output, so a downstream
    /// pipeline can keep going.
    ContinueOnError,
}

/// Orchestrates sandboxed executions. Calls are blocking and fully
/// self-contained; one `Executor` may be shared across threads.
pub struct Executor {
    sandboxes: Vec<Box<dyn Sandbox>>,
    policy: ErrorPolicy,
}

impl Executor {
    /// Executor with the built-in language sandboxes and fail-fast policy.
    #[must_use]
    pub fn new(config: SandboxConfig) -> Self {
        Self::with_policy(config, ErrorPolicy::FailFast)
    }

    /// Executor with the built-in language sandboxes and the given policy.
    #[must_use]
    pub fn with_policy(config: SandboxConfig, policy: ErrorPolicy) -> Self {
        let sandboxes: Vec<Box<dyn Sandbox>> = vec![
            Box::new(PythonSandbox::new(config.clone())),
            Box::new(JavaScriptSandbox::new(config)),
        ];
        Self::with_sandboxes(sandboxes, policy)
    }

    /// Executor over an explicit set of sandbox strategies. This is how a
    /// third language plugs in without touching the pipeline.
    #[must_use]
    pub fn with_sandboxes(sandboxes: Vec<Box<dyn Sandbox>>, policy: ErrorPolicy) -> Self {
        Self { sandboxes, policy }
    }

    /// Run one request through validate → wrap → spawn → decode.
    ///
    /// Under [`ErrorPolicy::FailFast`] any failure comes back as a typed
    /// [`BreakwaterError`]; under [`ErrorPolicy::ContinueOnError`] it comes
    /// back as a degraded success whose output is the error text.
    pub fn run(&self, request: &CodeRequest) -> Result<ExecutionResult> {
        let start = Instant::now();
        match self.run_inner(request, start) {
            Ok(result) => {
                tracing::info!(
                    language = %request.language,
                    duration_ms = result.duration.as_millis() as u64,
                    "execution succeeded"
                );
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(
                    language = %request.language,
                    kind = err.kind(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "execution failed: {err}"
                );
                match self.policy {
                    ErrorPolicy::FailFast => Err(err),
                    ErrorPolicy::ContinueOnError => Ok(Self::degrade(&err, start.elapsed())),
                }
            }
        }
    }

    fn run_inner(&self, request: &CodeRequest, start: Instant) -> Result<ExecutionResult> {
        request.check()?;
        let sandbox = self.sandbox_for(request)?;

        if let Some(message) = sandbox.validate(&request.source) {
            return Err(BreakwaterError::Validation(message));
        }

        let timeout = request
            .timeout_secs
            .map_or_else(|| sandbox.default_timeout(), Duration::from_secs);
        let raw = sandbox.execute(&request.source, &request.context, timeout)?;

        let mut result = protocol::decode(&raw)?;
        result.duration = start.elapsed();

        if result.success {
            Ok(result)
        } else {
            Err(BreakwaterError::Runtime(
                result
                    .error
                    .unwrap_or_else(|| "sandboxed code failed without a message".to_string()),
            ))
        }
    }

    fn sandbox_for(&self, request: &CodeRequest) -> Result<&dyn Sandbox> {
        self.sandboxes
            .iter()
            .find(|sandbox| sandbox.language() == request.language)
            .map(|sandbox| sandbox.as_ref())
            .ok_or_else(|| {
                BreakwaterError::Config(format!(
                    "no sandbox registered for language '{}'",
                    request.language
                ))
            })
    }

    /// Continue-on-error shape: a success whose output is the error text.
    fn degrade(err: &BreakwaterError, duration: Duration) -> ExecutionResult {
        ExecutionResult {
            success: true,
            output: Some(Value::String(err.to_string())),
            error: None,
            stdout: String::new(),
            duration,
        }
    }
}
