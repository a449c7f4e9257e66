//! Per-language sandbox strategies
//!
//! One [`Sandbox`] per supported language pairs the pre-flight validator
//! with the wrapper-plus-runner execution path. The orchestrator only talks
//! to this trait, so adding a language means adding an implementation, not
//! touching the orchestrator.

use std::time::Duration;

use crate::config::SandboxConfig;
use crate::request::{Context, Language};
use crate::runner::{self, RawProcessOutput};
use crate::{validate, wrapper, Result};

/// The validate+execute capability pair for one language.
pub trait Sandbox: Send + Sync {
    /// Language this sandbox handles.
    fn language(&self) -> Language;

    /// Static pre-flight check. `None` means the snippet may run; `Some`
    /// carries the rejection message and guarantees no process is spawned.
    fn validate(&self, source: &str) -> Option<String>;

    /// Budget applied when the request does not carry its own.
    fn default_timeout(&self) -> Duration;

    /// Build the wrapper program and run it in a fresh interpreter process.
    fn execute(
        &self,
        source: &str,
        context: &Context,
        timeout: Duration,
    ) -> Result<RawProcessOutput>;
}

/// Python sandbox: AST validation, restricted-builtins wrapper, `python3`.
pub struct PythonSandbox {
    config: SandboxConfig,
}

impl PythonSandbox {
    #[must_use]
    pub const fn new(config: SandboxConfig) -> Self {
        Self { config }
    }
}

impl Sandbox for PythonSandbox {
    fn language(&self) -> Language {
        Language::Python
    }

    fn validate(&self, source: &str) -> Option<String> {
        validate::python::validate(source)
    }

    fn default_timeout(&self) -> Duration {
        self.config.default_timeout
    }

    fn execute(
        &self,
        source: &str,
        context: &Context,
        timeout: Duration,
    ) -> Result<RawProcessOutput> {
        let program = wrapper::build(source, context, Language::Python)?;
        runner::execute(&program, &self.config.python_path, &self.config, timeout)
    }
}

/// JavaScript sandbox: token-scan validation, scoped-context wrapper, `node`.
pub struct JavaScriptSandbox {
    config: SandboxConfig,
}

impl JavaScriptSandbox {
    #[must_use]
    pub const fn new(config: SandboxConfig) -> Self {
        Self { config }
    }
}

impl Sandbox for JavaScriptSandbox {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn validate(&self, source: &str) -> Option<String> {
        validate::javascript::validate(source)
    }

    fn default_timeout(&self) -> Duration {
        self.config.default_timeout
    }

    fn execute(
        &self,
        source: &str,
        context: &Context,
        timeout: Duration,
    ) -> Result<RawProcessOutput> {
        let program = wrapper::build(source, context, Language::JavaScript)?;
        runner::execute(&program, &self.config.node_path, &self.config, timeout)
    }
}
