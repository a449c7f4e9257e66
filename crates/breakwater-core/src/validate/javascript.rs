//! JavaScript validator: substring token scan
//!
//! No parser is available for this language, so the check is a plain
//! substring match against [`super::BANNED_JS_TOKENS`]. This is strictly
//! weaker than the Python AST walk and is bypassable via aliasing or string
//! concatenation; the limitation is accepted and documented rather than
//! papered over.

use super::BANNED_JS_TOKENS;

/// Validate a JavaScript snippet. `None` means clean.
#[must_use]
pub fn validate(source: &str) -> Option<String> {
    BANNED_JS_TOKENS
        .iter()
        .find(|token| source.contains(*token))
        .map(|token| format!("use of '{token}' is not allowed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_code_passes() {
        let src = "const doubled = input.map((x) => x * 2);\nconst output = doubled;";
        assert_eq!(validate(src), None);
    }

    #[test]
    fn module_acquisition_is_rejected() {
        let msg = validate("const fs = require('fs');").unwrap();
        assert!(msg.contains("require("), "{msg}");

        let msg = validate("const mod = await import('fs');").unwrap();
        assert!(msg.contains("import("), "{msg}");
    }

    #[test]
    fn process_and_eval_are_rejected() {
        assert!(validate("process.exit(1);").is_some());
        assert!(validate("eval('1 + 1');").is_some());
        assert!(validate("new Function('return this')();").is_some());
    }

    #[test]
    fn global_escapes_and_raw_memory_are_rejected() {
        assert!(validate("globalThis.x = 1;").is_some());
        assert!(validate("({}).constructor.constructor('return 1')();").is_some());
        assert!(validate("const b = Buffer.alloc(8);").is_some());
        assert!(validate("new WebAssembly.Memory({ initial: 1 });").is_some());
    }

    #[test]
    fn scan_is_known_to_be_bypassable_by_concatenation() {
        // Documented limitation: token split across a concatenation slips
        // through the substring scan.
        assert_eq!(validate("const f = this['ev' + 'al'];"), None);
    }
}
