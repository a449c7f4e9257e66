//! Sandbox configuration

use std::path::PathBuf;
use std::time::Duration;

/// Configuration shared by every execution.
///
/// Interpreter paths and limits are read-only for the lifetime of an
/// [`crate::Executor`]; per-call knobs (timeout, context) live on
/// [`crate::CodeRequest`].
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Path to the Python interpreter
    pub python_path: PathBuf,

    /// Path to the JavaScript runtime
    pub node_path: PathBuf,

    /// Timeout applied when a request does not carry its own
    pub default_timeout: Duration,

    /// Cap on captured stdout/stderr, in bytes. The pipe keeps draining
    /// past the cap so the child never blocks on a full buffer.
    pub max_output_bytes: usize,

    /// Directory wrapper programs are written to. Each execution gets its
    /// own uniquely-named file that is removed on every exit path.
    pub temp_dir: PathBuf,

    /// Extra environment variables for the child process
    pub env: Vec<(String, String)>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            python_path: PathBuf::from("python3"),
            node_path: PathBuf::from("node"),
            default_timeout: Duration::from_secs(30),
            max_output_bytes: 10 * 1024 * 1024,
            temp_dir: std::env::temp_dir(),
            env: Vec::new(),
        }
    }
}

impl SandboxConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> SandboxConfigBuilder {
        SandboxConfigBuilder::default()
    }
}

/// Builder for [`SandboxConfig`]
#[derive(Debug, Default)]
pub struct SandboxConfigBuilder {
    config: SandboxConfig,
}

impl SandboxConfigBuilder {
    #[must_use]
    pub fn python_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.python_path = path.into();
        self
    }

    #[must_use]
    pub fn node_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.node_path = path.into();
        self
    }

    #[must_use]
    pub fn default_timeout(mut self, duration: Duration) -> Self {
        self.config.default_timeout = duration;
        self
    }

    #[must_use]
    pub fn max_output_bytes(mut self, bytes: usize) -> Self {
        self.config.max_output_bytes = bytes;
        self
    }

    #[must_use]
    pub fn temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = path.into();
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.env.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn build(self) -> SandboxConfig {
        self.config
    }
}
