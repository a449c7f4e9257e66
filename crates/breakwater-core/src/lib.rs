//! # breakwater-core
//!
//! Sandboxed execution engine for untrusted Python and JavaScript snippets.
//!
//! A snippet plus a map of named input values goes in; a structured
//! [`ExecutionResult`] comes out. Each call is fully self-contained:
//!
//! - static pre-flight validation (AST walk for Python, token scan for
//!   JavaScript) before any process is spawned
//! - a generated wrapper program that embeds the snippet and its context
//!   and frames the result between sentinel marker lines on stdout
//! - one short-lived interpreter process per call, written to a scoped
//!   temp file that is deleted on every exit path
//! - a wall-clock timeout that kills the whole process group on expiry
//!
//! The public entry point is [`Executor::run`].

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod executor;
pub mod protocol;
pub mod request;
pub mod result;
pub mod runner;
pub mod sandbox;
pub mod validate;
pub mod wrapper;

pub use config::SandboxConfig;
pub use error::BreakwaterError;
pub use executor::{ErrorPolicy, Executor};
pub use request::{CodeRequest, Context, Language, INPUT_KEY};
pub use result::ExecutionResult;

/// Crate-level result type
pub type Result<T> = std::result::Result<T, BreakwaterError>;
