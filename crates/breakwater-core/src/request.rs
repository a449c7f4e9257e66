//! Execution request types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{BreakwaterError, Result};

/// Conventional context key the upstream value is bound to.
///
/// The workflow engine puts the previous node's output under this name;
/// user snippets read it as a plain variable.
pub const INPUT_KEY: &str = "input";

/// Timeout bounds in seconds, inclusive.
pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Named input values injected into the sandboxed scope before the snippet
/// runs. Keys keep insertion order; values are JSON by construction, so
/// every context is serializable into the wrapper program.
pub type Context = serde_json::Map<String, Value>;

/// Supported snippet languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
}

impl Language {
    /// Source-file extension for the generated wrapper program.
    #[must_use]
    pub const fn file_extension(&self) -> &'static str {
        match self {
            Self::Python => ".py",
            Self::JavaScript => ".js",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Python => write!(f, "python"),
            Self::JavaScript => write!(f, "javascript"),
        }
    }
}

/// One sandboxed execution: a snippet, its inputs, and a wall-clock budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeRequest {
    /// Snippet language
    pub language: Language,

    /// Raw source text (any templating already resolved upstream)
    pub source: String,

    /// Named values injected into the snippet's scope
    pub context: Context,

    /// Wall-clock budget in seconds (1..=300). `None` defers to the
    /// [`crate::SandboxConfig`] default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl CodeRequest {
    /// Create a request with an empty context and the config's default budget.
    pub fn new(language: Language, source: impl Into<String>) -> Self {
        Self {
            language,
            source: source.into(),
            context: Context::new(),
            timeout_secs: None,
        }
    }

    /// Bind the upstream value under the conventional [`INPUT_KEY`].
    #[must_use]
    pub fn input(mut self, value: Value) -> Self {
        self.context.insert(INPUT_KEY.to_string(), value);
        self
    }

    /// Bind an auxiliary variable.
    #[must_use]
    pub fn var(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Check the request invariants that hold before any validation or
    /// process spawn: an explicit timeout must sit inside its documented
    /// bounds. The config default is the owner's responsibility.
    pub fn check(&self) -> Result<()> {
        if let Some(secs) = self.timeout_secs {
            if secs < MIN_TIMEOUT_SECS || secs > MAX_TIMEOUT_SECS {
                return Err(BreakwaterError::Config(format!(
                    "timeout_secs must be within {MIN_TIMEOUT_SECS}..={MAX_TIMEOUT_SECS}, got {secs}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_binds_input_and_vars_in_order() {
        let req = CodeRequest::new(Language::Python, "output = input")
            .input(json!([1, 2]))
            .var("limit", json!(5));

        let keys: Vec<&str> = req.context.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["input", "limit"]);
        assert_eq!(req.context["input"], json!([1, 2]));
    }

    #[test]
    fn timeout_bounds_are_enforced() {
        let req = CodeRequest::new(Language::Python, "output = 1").timeout_secs(0);
        assert!(req.check().is_err());

        let req = CodeRequest::new(Language::Python, "output = 1").timeout_secs(301);
        assert!(req.check().is_err());

        let req = CodeRequest::new(Language::Python, "output = 1").timeout_secs(300);
        assert!(req.check().is_ok());
    }

    #[test]
    fn unset_timeout_defers_to_the_config_default() {
        let req = CodeRequest::new(Language::Python, "output = 1");
        assert_eq!(req.timeout_secs, None);
        assert!(req.check().is_ok());
    }
}
