//! Python validator: full AST walk
//!
//! Parses the snippet with `rustpython-parser` and visits every node.
//! Rejected constructs:
//!
//! - import of any module outside [`super::SAFE_PYTHON_MODULES`]
//! - any reference to a name in [`super::BANNED_PYTHON_NAMES`]
//! - any call to a name in [`super::BANNED_PYTHON_CALLS`]
//! - attribute access rooted at an identifier in
//!   [`super::RESTRICTED_PYTHON_ROOTS`]
//!
//! Syntax errors are reported with a 1-based line number.

use rustpython_parser::{Parse, ast};

use super::{
    BANNED_PYTHON_CALLS, BANNED_PYTHON_NAMES, RESTRICTED_PYTHON_ROOTS, SAFE_PYTHON_MODULES,
};

/// Validate a Python snippet. `None` means clean.
#[must_use]
pub fn validate(source: &str) -> Option<String> {
    let suite = match ast::Suite::parse(source, "<snippet>") {
        Ok(suite) => suite,
        Err(err) => {
            let line = line_of_offset(source, err.offset.to_usize());
            return Some(format!("syntax error at line {line}: {}", err.error));
        }
    };

    check_stmts(&suite)
}

fn line_of_offset(source: &str, offset: usize) -> usize {
    let offset = offset.min(source.len());
    source[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}

fn check_import(module: &str) -> Option<String> {
    let root = module.split('.').next().unwrap_or(module);
    if SAFE_PYTHON_MODULES.contains(&root) {
        None
    } else {
        Some(format!("import of module '{module}' is not allowed"))
    }
}

fn check_stmts(stmts: &[ast::Stmt]) -> Option<String> {
    stmts.iter().find_map(check_stmt)
}

fn check_opt_expr(expr: Option<&ast::Expr>) -> Option<String> {
    expr.and_then(check_expr)
}

#[allow(clippy::too_many_lines)]
fn check_stmt(stmt: &ast::Stmt) -> Option<String> {
    match stmt {
        ast::Stmt::Import(ast::StmtImport { names, .. }) => names
            .iter()
            .find_map(|alias| check_import(alias.name.as_str())),
        ast::Stmt::ImportFrom(ast::StmtImportFrom { module, .. }) => module.as_ref().map_or_else(
            || Some("relative imports are not allowed".to_string()),
            |module| check_import(module.as_str()),
        ),
        ast::Stmt::FunctionDef(ast::StmtFunctionDef {
            args,
            body,
            decorator_list,
            returns,
            ..
        })
        | ast::Stmt::AsyncFunctionDef(ast::StmtAsyncFunctionDef {
            args,
            body,
            decorator_list,
            returns,
            ..
        }) => check_arguments(args)
            .or_else(|| check_stmts(body))
            .or_else(|| check_exprs(decorator_list))
            .or_else(|| check_opt_expr(returns.as_deref())),
        ast::Stmt::ClassDef(ast::StmtClassDef {
            bases,
            keywords,
            body,
            decorator_list,
            ..
        }) => check_exprs(bases)
            .or_else(|| check_keywords(keywords))
            .or_else(|| check_stmts(body))
            .or_else(|| check_exprs(decorator_list)),
        ast::Stmt::Return(ast::StmtReturn { value, .. }) => check_opt_expr(value.as_deref()),
        ast::Stmt::Delete(ast::StmtDelete { targets, .. }) => check_exprs(targets),
        ast::Stmt::Assign(ast::StmtAssign { targets, value, .. }) => {
            check_exprs(targets).or_else(|| check_expr(value))
        }
        ast::Stmt::AugAssign(ast::StmtAugAssign { target, value, .. }) => {
            check_expr(target).or_else(|| check_expr(value))
        }
        ast::Stmt::AnnAssign(ast::StmtAnnAssign {
            target,
            annotation,
            value,
            ..
        }) => check_expr(target)
            .or_else(|| check_expr(annotation))
            .or_else(|| check_opt_expr(value.as_deref())),
        ast::Stmt::For(ast::StmtFor {
            target,
            iter,
            body,
            orelse,
            ..
        })
        | ast::Stmt::AsyncFor(ast::StmtAsyncFor {
            target,
            iter,
            body,
            orelse,
            ..
        }) => check_expr(target)
            .or_else(|| check_expr(iter))
            .or_else(|| check_stmts(body))
            .or_else(|| check_stmts(orelse)),
        ast::Stmt::While(ast::StmtWhile {
            test, body, orelse, ..
        }) => check_expr(test)
            .or_else(|| check_stmts(body))
            .or_else(|| check_stmts(orelse)),
        ast::Stmt::If(ast::StmtIf {
            test, body, orelse, ..
        }) => check_expr(test)
            .or_else(|| check_stmts(body))
            .or_else(|| check_stmts(orelse)),
        ast::Stmt::With(ast::StmtWith { items, body, .. })
        | ast::Stmt::AsyncWith(ast::StmtAsyncWith { items, body, .. }) => items
            .iter()
            .find_map(|item| {
                check_expr(&item.context_expr)
                    .or_else(|| check_opt_expr(item.optional_vars.as_deref()))
            })
            .or_else(|| check_stmts(body)),
        ast::Stmt::Match(ast::StmtMatch { subject, cases, .. }) => check_expr(subject)
            .or_else(|| {
                cases.iter().find_map(|case| {
                    check_pattern(&case.pattern)
                        .or_else(|| check_opt_expr(case.guard.as_deref()))
                        .or_else(|| check_stmts(&case.body))
                })
            }),
        ast::Stmt::Raise(ast::StmtRaise { exc, cause, .. }) => {
            check_opt_expr(exc.as_deref()).or_else(|| check_opt_expr(cause.as_deref()))
        }
        ast::Stmt::Try(ast::StmtTry {
            body,
            handlers,
            orelse,
            finalbody,
            ..
        })
        | ast::Stmt::TryStar(ast::StmtTryStar {
            body,
            handlers,
            orelse,
            finalbody,
            ..
        }) => check_stmts(body)
            .or_else(|| handlers.iter().find_map(check_handler))
            .or_else(|| check_stmts(orelse))
            .or_else(|| check_stmts(finalbody)),
        ast::Stmt::Assert(ast::StmtAssert { test, msg, .. }) => {
            check_expr(test).or_else(|| check_opt_expr(msg.as_deref()))
        }
        ast::Stmt::Expr(ast::StmtExpr { value, .. }) => check_expr(value),
        // Global, Nonlocal, Pass, Break, Continue carry no expressions
        _ => None,
    }
}

fn check_exprs(exprs: &[ast::Expr]) -> Option<String> {
    exprs.iter().find_map(check_expr)
}

#[allow(clippy::too_many_lines)]
fn check_expr(expr: &ast::Expr) -> Option<String> {
    match expr {
        ast::Expr::Name(ast::ExprName { id, .. }) => {
            let name = id.as_str();
            if BANNED_PYTHON_NAMES.contains(&name) {
                Some(format!("use of '{name}' is not allowed"))
            } else {
                None
            }
        }
        ast::Expr::Attribute(ast::ExprAttribute { value, attr, .. }) => {
            if let Some(root) = attribute_root(value) {
                if RESTRICTED_PYTHON_ROOTS.contains(&root) {
                    return Some(format!("access to '{root}.{}' is not allowed", attr.as_str()));
                }
            }
            check_expr(value)
        }
        ast::Expr::Call(ast::ExprCall {
            func,
            args,
            keywords,
            ..
        }) => {
            if let ast::Expr::Name(ast::ExprName { id, .. }) = func.as_ref() {
                if BANNED_PYTHON_CALLS.contains(&id.as_str()) {
                    return Some(format!("calling '{}' is not allowed", id.as_str()));
                }
            }
            check_expr(func)
                .or_else(|| check_exprs(args))
                .or_else(|| check_keywords(keywords))
        }
        ast::Expr::BoolOp(ast::ExprBoolOp { values, .. }) => check_exprs(values),
        ast::Expr::NamedExpr(ast::ExprNamedExpr { target, value, .. }) => {
            check_expr(target).or_else(|| check_expr(value))
        }
        ast::Expr::BinOp(ast::ExprBinOp { left, right, .. }) => {
            check_expr(left).or_else(|| check_expr(right))
        }
        ast::Expr::UnaryOp(ast::ExprUnaryOp { operand, .. }) => check_expr(operand),
        ast::Expr::Lambda(ast::ExprLambda { args, body, .. }) => {
            check_arguments(args).or_else(|| check_expr(body))
        }
        ast::Expr::IfExp(ast::ExprIfExp {
            test, body, orelse, ..
        }) => check_expr(test)
            .or_else(|| check_expr(body))
            .or_else(|| check_expr(orelse)),
        ast::Expr::Dict(ast::ExprDict { keys, values, .. }) => keys
            .iter()
            .find_map(|key| check_opt_expr(key.as_ref()))
            .or_else(|| check_exprs(values)),
        ast::Expr::Set(ast::ExprSet { elts, .. })
        | ast::Expr::List(ast::ExprList { elts, .. })
        | ast::Expr::Tuple(ast::ExprTuple { elts, .. }) => check_exprs(elts),
        ast::Expr::ListComp(ast::ExprListComp {
            elt, generators, ..
        })
        | ast::Expr::SetComp(ast::ExprSetComp {
            elt, generators, ..
        })
        | ast::Expr::GeneratorExp(ast::ExprGeneratorExp {
            elt, generators, ..
        }) => check_expr(elt).or_else(|| check_comprehensions(generators)),
        ast::Expr::DictComp(ast::ExprDictComp {
            key,
            value,
            generators,
            ..
        }) => check_expr(key)
            .or_else(|| check_expr(value))
            .or_else(|| check_comprehensions(generators)),
        ast::Expr::Await(ast::ExprAwait { value, .. })
        | ast::Expr::YieldFrom(ast::ExprYieldFrom { value, .. })
        | ast::Expr::Starred(ast::ExprStarred { value, .. }) => check_expr(value),
        ast::Expr::Yield(ast::ExprYield { value, .. }) => check_opt_expr(value.as_deref()),
        ast::Expr::Compare(ast::ExprCompare {
            left, comparators, ..
        }) => check_expr(left).or_else(|| check_exprs(comparators)),
        ast::Expr::FormattedValue(ast::ExprFormattedValue {
            value, format_spec, ..
        }) => check_expr(value).or_else(|| check_opt_expr(format_spec.as_deref())),
        ast::Expr::JoinedStr(ast::ExprJoinedStr { values, .. }) => check_exprs(values),
        ast::Expr::Subscript(ast::ExprSubscript { value, slice, .. }) => {
            check_expr(value).or_else(|| check_expr(slice))
        }
        ast::Expr::Slice(ast::ExprSlice {
            lower, upper, step, ..
        }) => check_opt_expr(lower.as_deref())
            .or_else(|| check_opt_expr(upper.as_deref()))
            .or_else(|| check_opt_expr(step.as_deref())),
        _ => None,
    }
}

/// Root identifier of an attribute chain (`os.path.join` -> `os`).
fn attribute_root(expr: &ast::Expr) -> Option<&str> {
    match expr {
        ast::Expr::Name(ast::ExprName { id, .. }) => Some(id.as_str()),
        ast::Expr::Attribute(ast::ExprAttribute { value, .. }) => attribute_root(value),
        _ => None,
    }
}

fn check_arguments(args: &ast::Arguments) -> Option<String> {
    let with_default = |arg: &ast::ArgWithDefault| {
        check_opt_expr(arg.default.as_deref())
            .or_else(|| check_opt_expr(arg.def.annotation.as_deref()))
    };

    args.posonlyargs
        .iter()
        .find_map(with_default)
        .or_else(|| args.args.iter().find_map(with_default))
        .or_else(|| args.kwonlyargs.iter().find_map(with_default))
        .or_else(|| {
            args.vararg
                .as_deref()
                .and_then(|arg| check_opt_expr(arg.annotation.as_deref()))
        })
        .or_else(|| {
            args.kwarg
                .as_deref()
                .and_then(|arg| check_opt_expr(arg.annotation.as_deref()))
        })
}

fn check_keywords(keywords: &[ast::Keyword]) -> Option<String> {
    keywords.iter().find_map(|kw| check_expr(&kw.value))
}

fn check_comprehensions(generators: &[ast::Comprehension]) -> Option<String> {
    generators.iter().find_map(|comp| {
        check_expr(&comp.target)
            .or_else(|| check_expr(&comp.iter))
            .or_else(|| check_exprs(&comp.ifs))
    })
}

fn check_handler(handler: &ast::ExceptHandler) -> Option<String> {
    match handler {
        ast::ExceptHandler::ExceptHandler(ast::ExceptHandlerExceptHandler {
            type_, body, ..
        }) => check_opt_expr(type_.as_deref()).or_else(|| check_stmts(body)),
    }
}

fn check_pattern(pattern: &ast::Pattern) -> Option<String> {
    match pattern {
        ast::Pattern::MatchValue(ast::PatternMatchValue { value, .. }) => check_expr(value),
        ast::Pattern::MatchSingleton(_) | ast::Pattern::MatchStar(_) => None,
        ast::Pattern::MatchSequence(ast::PatternMatchSequence { patterns, .. })
        | ast::Pattern::MatchOr(ast::PatternMatchOr { patterns, .. }) => {
            patterns.iter().find_map(check_pattern)
        }
        ast::Pattern::MatchMapping(ast::PatternMatchMapping { keys, patterns, .. }) => {
            check_exprs(keys).or_else(|| patterns.iter().find_map(check_pattern))
        }
        ast::Pattern::MatchClass(ast::PatternMatchClass {
            cls,
            patterns,
            kwd_patterns,
            ..
        }) => check_expr(cls)
            .or_else(|| patterns.iter().find_map(check_pattern))
            .or_else(|| kwd_patterns.iter().find_map(check_pattern)),
        ast::Pattern::MatchAs(ast::PatternMatchAs { pattern, .. }) => {
            pattern.as_deref().and_then(check_pattern)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_code_passes() {
        let src = "import json\nvalues = [x * 2 for x in range(10)]\noutput = json.dumps(values)";
        assert_eq!(validate(src), None);
    }

    #[test]
    fn non_whitelisted_import_is_rejected() {
        let msg = validate("import os\noutput = 1").unwrap();
        assert!(msg.contains("os"), "{msg}");
    }

    #[test]
    fn from_import_is_checked_against_whitelist() {
        assert_eq!(validate("from math import sqrt\noutput = sqrt(4)"), None);
        let msg = validate("from subprocess import run").unwrap();
        assert!(msg.contains("subprocess"), "{msg}");
    }

    #[test]
    fn dotted_import_is_checked_by_root() {
        let msg = validate("import os.path").unwrap();
        assert!(msg.contains("os"), "{msg}");
    }

    #[test]
    fn banned_names_are_rejected_anywhere() {
        let msg = validate("x = eval('1 + 1')").unwrap();
        assert!(msg.contains("eval"), "{msg}");

        let msg = validate("def f():\n    return open('/etc/passwd')").unwrap();
        assert!(msg.contains("open"), "{msg}");

        let msg = validate("items = [compile(s, '<s>', 'eval') for s in names]").unwrap();
        assert!(msg.contains("compile"), "{msg}");
    }

    #[test]
    fn restricted_attribute_roots_are_rejected() {
        let msg = validate("x = os.system('ls')").unwrap();
        assert!(msg.contains("os.system"), "{msg}");

        let msg = validate("sys.modules.clear()").unwrap();
        assert!(msg.contains("sys"), "{msg}");
    }

    #[test]
    fn syntax_error_reports_line_number() {
        let msg = validate("x = 1\ny = (").unwrap();
        assert!(msg.contains("syntax error"), "{msg}");
        assert!(msg.contains("line 2"), "{msg}");
    }

    #[test]
    fn banned_name_inside_lambda_default_is_found() {
        let msg = validate("f = lambda x=input(): x").unwrap();
        assert!(msg.contains("input"), "{msg}");
    }

    #[test]
    fn input_as_a_plain_variable_is_allowed() {
        // `input` is the conventional context binding; reading it must pass.
        assert_eq!(validate("output = input * 2"), None);
        assert_eq!(validate("output = [x for x in input]"), None);
    }

    #[test]
    fn calling_input_is_rejected() {
        let msg = validate("name = input('who? ')").unwrap();
        assert!(msg.contains("input"), "{msg}");
    }
}
