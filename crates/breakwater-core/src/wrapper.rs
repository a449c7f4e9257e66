//! Wrapper program generation
//!
//! Deterministically builds the self-contained program the runner hands to
//! the interpreter: the user's snippet, a restricted execution surface, and
//! the serialized context, framed so the result comes back between sentinel
//! marker lines on stdout (see [`crate::protocol`]).
//!
//! Context and snippet are embedded as JSON-escaped string literals, so
//! backslashes and quote characters can never break out of the enclosing
//! string. Template substitution is single-pass: placeholder-looking text
//! inside the snippet or the context is never re-expanded.

use crate::protocol::RESULT_MARKER;
use crate::request::{Context, Language};
use crate::validate::{SAFE_PYTHON_BUILTINS, SAFE_PYTHON_MODULES};
use crate::Result;

/// The generated, single-use program text for one execution.
#[derive(Debug, Clone)]
pub struct WrapperProgram {
    pub language: Language,
    pub text: String,
}

/// Build the wrapper program for the given snippet and context.
pub fn build(source: &str, context: &Context, language: Language) -> Result<WrapperProgram> {
    let text = match language {
        Language::Python => build_python(source, context)?,
        Language::JavaScript => build_javascript(source, context)?,
    };
    Ok(WrapperProgram { language, text })
}

const PYTHON_TEMPLATE: &str = r#"import json as _bw_json
import sys as _bw_sys
import traceback as _bw_traceback
import builtins as _bw_builtins
import @BW_MODULE_IMPORTS@

_BW_MARKER = @BW_MARKER@
_BW_SAFE_MODULES = {@BW_MODULE_SET@}
_BW_SAFE_BUILTINS = (@BW_BUILTIN_TUPLE@)

_bw_real_import = _bw_builtins.__import__


def _bw_import(name, *args, **kwargs):
    if name.split(".")[0] in _BW_SAFE_MODULES:
        return _bw_real_import(name, *args, **kwargs)
    raise ImportError("module '%s' is not available in the sandbox" % name)


_bw_safe = {}
for _bw_name in _BW_SAFE_BUILTINS:
    if hasattr(_bw_builtins, _bw_name):
        _bw_safe[_bw_name] = getattr(_bw_builtins, _bw_name)
_bw_safe["__import__"] = _bw_import

_bw_scope = {"__builtins__": _bw_safe, "__name__": "__sandbox__"}
for _bw_mod in (@BW_MODULE_TUPLE@):
    _bw_scope[_bw_mod.__name__] = _bw_mod
_bw_scope.update(_bw_json.loads(@BW_CONTEXT@))

_bw_frame = {"success": True, "output": None, "error": None}
try:
    exec(compile(@BW_SOURCE@, "<snippet>", "exec"), _bw_scope)
    _bw_frame["output"] = _bw_scope.get("output", _bw_scope.get("result"))
except BaseException:
    _bw_frame["success"] = False
    _bw_frame["error"] = _bw_traceback.format_exc()

try:
    _bw_line = _bw_json.dumps(_bw_frame)
except (TypeError, ValueError) as _bw_err:
    _bw_line = _bw_json.dumps(
        {
            "success": False,
            "output": None,
            "error": "result is not JSON-serializable: %s" % _bw_err,
        }
    )

_bw_sys.stdout.flush()
print(_BW_MARKER)
print(_bw_line)
print(_BW_MARKER)
_bw_sys.stdout.flush()
"#;

fn build_python(source: &str, context: &Context) -> Result<String> {
    let context_literal = string_literal(&serde_json::to_string(context)?);
    let source_literal = string_literal(source);

    let module_set = SAFE_PYTHON_MODULES
        .iter()
        .map(|m| format!("\"{m}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let builtin_tuple = SAFE_PYTHON_BUILTINS
        .iter()
        .map(|b| format!("\"{b}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let module_list = SAFE_PYTHON_MODULES.join(", ");

    Ok(fill(
        PYTHON_TEMPLATE,
        &[
            ("@BW_MODULE_IMPORTS@", &module_list),
            ("@BW_MODULE_SET@", &module_set),
            ("@BW_BUILTIN_TUPLE@", &builtin_tuple),
            ("@BW_MODULE_TUPLE@", &module_list),
            ("@BW_MARKER@", &string_literal(RESULT_MARKER)),
            ("@BW_CONTEXT@", &context_literal),
            ("@BW_SOURCE@", &source_literal),
        ],
    ))
}

const JAVASCRIPT_TEMPLATE: &str = r#""use strict";

const __bw_marker = @BW_MARKER@;
const __bw_context = JSON.parse(@BW_CONTEXT@);
@BW_BINDINGS@
let __bw_frame;
try {
@BW_SOURCE@
    let __bw_output = null;
    if (typeof output !== "undefined") {
        __bw_output = output;
    } else if (typeof result !== "undefined") {
        __bw_output = result;
    }
    __bw_frame = {
        success: true,
        output: __bw_output === undefined ? null : __bw_output,
        error: null,
    };
} catch (__bw_err) {
    __bw_frame = {
        success: false,
        output: null,
        error: __bw_err && __bw_err.stack ? String(__bw_err.stack) : String(__bw_err),
    };
}

let __bw_line;
try {
    __bw_line = JSON.stringify(__bw_frame);
    if (__bw_line === undefined) {
        throw new TypeError("result serialized to undefined");
    }
} catch (__bw_err) {
    __bw_line = JSON.stringify({
        success: false,
        output: null,
        error: "result is not JSON-serializable: " + __bw_err,
    });
}

console.log(__bw_marker);
console.log(__bw_line);
console.log(__bw_marker);
"#;

fn build_javascript(source: &str, context: &Context) -> Result<String> {
    let context_literal = string_literal(&serde_json::to_string(context)?);

    // One `let` binding per context key; keys that are not valid identifiers
    // stay reachable only through the parsed context object.
    let bindings = context
        .keys()
        .filter(|key| is_js_identifier(key))
        .map(|key| format!("let {key} = __bw_context[{}];", string_literal(key)))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(fill(
        JAVASCRIPT_TEMPLATE,
        &[
            ("@BW_MARKER@", &string_literal(RESULT_MARKER)),
            ("@BW_CONTEXT@", &context_literal),
            ("@BW_BINDINGS@", &bindings),
            ("@BW_SOURCE@", source),
        ],
    ))
}

/// JSON-escaped double-quoted string literal, valid in both Python and
/// JavaScript source.
fn string_literal(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

/// Single-pass template substitution. Each placeholder is looked up in the
/// template only; substituted values are never rescanned, so a snippet that
/// happens to contain a placeholder token cannot trigger a second expansion.
fn fill(template: &str, subs: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while !rest.is_empty() {
        let next = subs
            .iter()
            .filter_map(|(key, value)| rest.find(*key).map(|idx| (idx, *key, *value)))
            .min_by_key(|(idx, ..)| *idx);
        match next {
            Some((idx, key, value)) => {
                out.push_str(&rest[..idx]);
                out.push_str(value);
                rest = &rest[idx + key.len()..];
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }
    out
}

const JS_RESERVED: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

fn is_js_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
    starts_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !JS_RESERVED.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn context(pairs: &[(&str, Value)]) -> Context {
        let mut ctx = Context::new();
        for (key, value) in pairs {
            ctx.insert((*key).to_string(), value.clone());
        }
        ctx
    }

    #[test]
    fn python_wrapper_embeds_escaped_context() {
        let ctx = context(&[("msg", json!("say \"hi\"\nbye"))]);
        let program = build("output = msg", &ctx, Language::Python).unwrap();

        // Double-encoded: the quote inside the value must not appear bare.
        assert!(program.text.contains(r#"\\\"hi\\\""#), "{}", program.text);
        // Snippet goes in as a literal fed to exec, never inlined raw.
        assert!(program.text.contains(r#"exec(compile("output = msg""#));
    }

    #[test]
    fn python_wrapper_frames_with_markers() {
        let program = build("output = 1", &Context::new(), Language::Python).unwrap();
        assert_eq!(
            program.text.matches("print(_BW_MARKER)").count(),
            2,
            "{}",
            program.text
        );
    }

    #[test]
    fn placeholder_text_in_snippet_is_not_reexpanded() {
        let ctx = context(&[("x", json!("@BW_SOURCE@"))]);
        let program = build("output = \"@BW_CONTEXT@\"", &ctx, Language::Python).unwrap();

        // Both placeholder-looking tokens survive verbatim inside literals.
        assert!(program.text.contains("@BW_SOURCE@"));
        assert!(program.text.contains("@BW_CONTEXT@"));
    }

    #[test]
    fn javascript_wrapper_binds_identifier_keys_only() {
        let ctx = context(&[
            ("items", json!([1, 2])),
            ("not-an-ident", json!(true)),
            ("class", json!(1)),
        ]);
        let program = build("const output = items;", &ctx, Language::JavaScript).unwrap();

        assert!(program.text.contains("let items = __bw_context[\"items\"];"));
        assert!(!program.text.contains("let not-an-ident"));
        assert!(!program.text.contains("let class"));
    }

    #[test]
    fn javascript_wrapper_inlines_snippet_inside_try() {
        let program =
            build("const output = 1;", &Context::new(), Language::JavaScript).unwrap();
        let try_pos = program.text.find("try {").unwrap();
        let src_pos = program.text.find("const output = 1;").unwrap();
        let catch_pos = program.text.find("} catch (__bw_err)").unwrap();
        assert!(try_pos < src_pos && src_pos < catch_pos);
    }

    #[test]
    fn js_identifier_rules() {
        assert!(is_js_identifier("foo"));
        assert!(is_js_identifier("_bar9"));
        assert!(is_js_identifier("$x"));
        assert!(!is_js_identifier("9lives"));
        assert!(!is_js_identifier("a-b"));
        assert!(!is_js_identifier("let"));
        assert!(!is_js_identifier(""));
    }
}
