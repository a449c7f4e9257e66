//! Static pre-flight validation
//!
//! Rejects disallowed constructs before any process is spawned. Validation
//! never touches the filesystem. The policy tables below are process-wide,
//! immutable configuration shared with the wrapper builder.

pub mod javascript;
pub mod python;

use crate::Language;

/// Python modules a snippet may import; the wrapper pre-binds these into the
/// restricted namespace.
pub const SAFE_PYTHON_MODULES: &[&str] = &[
    "json",
    "math",
    "random",
    "re",
    "datetime",
    "collections",
    "itertools",
    "functools",
];

/// Python builtins a snippet may use inside the restricted namespace.
pub const SAFE_PYTHON_BUILTINS: &[&str] = &[
    "abs", "all", "any", "bool", "dict", "divmod", "enumerate", "filter", "float", "format",
    "frozenset", "hash", "int", "isinstance", "issubclass", "iter", "len", "list", "map", "max",
    "min", "next", "print", "range", "repr", "reversed", "round", "set", "sorted", "str", "sum",
    "tuple", "type", "zip", "Exception", "ValueError", "TypeError", "KeyError", "IndexError",
    "ZeroDivisionError", "ArithmeticError", "AttributeError", "RuntimeError", "StopIteration",
    "__build_class__",
];

/// Names whose mere reference is rejected in Python snippets: dynamic
/// evaluation, dynamic import, and file access.
pub const BANNED_PYTHON_NAMES: &[&str] = &["eval", "exec", "compile", "__import__", "open"];

/// Names rejected only at call sites. `input` doubles as the conventional
/// context binding ([`crate::INPUT_KEY`]), so reading it as a plain variable
/// must stay legal; only the interactive builtin call is blocked.
pub const BANNED_PYTHON_CALLS: &[&str] = &["input"];

/// Identifiers treated as system/process/OS modules: attribute access rooted
/// at one of these is rejected even if the name was never imported.
pub const RESTRICTED_PYTHON_ROOTS: &[&str] =
    &["os", "sys", "subprocess", "shutil", "socket", "ctypes", "importlib"];

/// Dangerous JavaScript tokens, matched as plain substrings. Strictly weaker
/// than an AST walk (aliasing or string concatenation can slip past); kept
/// deliberately at the original's guarantee level.
pub const BANNED_JS_TOKENS: &[&str] = &[
    "require(",
    "import(",
    "child_process",
    "process.",
    "eval(",
    "new Function",
    "Function(",
    "globalThis",
    "constructor.constructor",
    "Buffer",
    "SharedArrayBuffer",
    "WebAssembly",
];

/// Run the language's validator. `None` means the snippet passed; `Some`
/// carries a human-readable rejection message.
#[must_use]
pub fn validate(source: &str, language: Language) -> Option<String> {
    match language {
        Language::Python => python::validate(source),
        Language::JavaScript => javascript::validate(source),
    }
}
