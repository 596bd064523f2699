//! Dependency scanning and minification over the oxc parser.
//!
//! Sources are parsed into an AST and dependency calls are collected with a
//! visitor. Rewriting works on the source text by byte range, so everything
//! outside the dependency literals stays as written.

use std::collections::HashMap;
use std::fmt::Display;
use std::ops::Range;
use std::path::Path;

use miette::{NamedSource, SourceSpan};
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, CallExpression, Expression, ImportExpression, Statement, TemplateLiteral,
};
use oxc_ast::{visit::walk, Visit};
use oxc_codegen::{CodeGenerator, CodegenOptions};
use oxc_minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};

use crate::core::error::{BundleError, BundleResult, InvalidRequireCall};
use crate::util::paths;

/// Callees whose single string argument is a dependency.
const REQUIRE_CALLEES: &[&str] = &["require", "_$$_IMPORT_DEFAULT", "_$$_IMPORT_ALL"];
const PREFETCH_CALLEE: &str = "__prefetchImport";

/// How a dependency is introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// `require("x")` and the import helpers; the literal is replaced.
    Require,
    /// `import("x")`; the call becomes an async require.
    Import,
    /// `__prefetchImport("x")`; the call becomes an async prefetch.
    Prefetch,
}

/// One dependency call found in a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCall {
    pub kind: CallKind,
    pub specifier: String,
    /// Byte range of the whole call expression.
    pub call: Range<usize>,
    /// Byte range of the string literal argument.
    pub literal: Range<usize>,
}

/// What scanning a source found.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub calls: Vec<DependencyCall>,
    /// The source uses `import`/`export` declarations.
    pub es_module: bool,
    /// The source starts with a `"use strict"` directive.
    pub strict: bool,
}

/// Find every dependency call in `src`.
///
/// The source is parsed as a module first and as a sloppy-mode script when
/// that fails. Calls that do not take exactly one string literal are
/// rejected.
pub fn scan(path: &Path, src: &str) -> BundleResult<ScanOutput> {
    let allocator = Allocator::default();
    let source_type = source_type(path);

    let mut ret = Parser::new(&allocator, src, source_type.with_module(true)).parse();
    if !ret.errors.is_empty() {
        let script = Parser::new(&allocator, src, source_type.with_script(true)).parse();
        if script.errors.is_empty() {
            ret = script;
        }
    }
    if let Some(error) = ret.errors.first() {
        return Err(syntax_error(path, error));
    }

    let program = &ret.program;
    let mut collector = CallCollector::default();
    collector.visit_program(program);

    if let Some(call) = collector.invalid {
        return Err(invalid_call(path, src, call).into());
    }
    let mut calls = collector.calls;
    calls.sort_by_key(|call| call.call.start);

    Ok(ScanOutput {
        calls,
        es_module: program.body.iter().any(is_module_declaration),
        strict: program
            .directives
            .iter()
            .any(|d| d.directive.as_str() == "use strict"),
    })
}

/// Replace dependency literals with module identifiers.
///
/// Specifiers missing from `ids` keep their original text. `import()` and
/// `__prefetchImport()` become calls on the module registered under
/// `async_require` in `ids`.
pub fn rewrite(
    src: &str,
    calls: &[DependencyCall],
    ids: &HashMap<String, String>,
    async_require: &str,
) -> String {
    let id_of = |spec: &str| quote(ids.get(spec).map_or(spec, String::as_str));
    let mut out = String::with_capacity(src.len());
    let mut last = 0;

    for call in calls {
        match call.kind {
            CallKind::Require => {
                out.push_str(&src[last..call.literal.start]);
                out.push_str(&id_of(&call.specifier));
                last = call.literal.end;
            }
            CallKind::Import => {
                out.push_str(&src[last..call.call.start]);
                out.push_str(&format!(
                    "require({})({})",
                    id_of(async_require),
                    id_of(&call.specifier)
                ));
                last = call.call.end;
            }
            CallKind::Prefetch => {
                out.push_str(&src[last..call.call.start]);
                out.push_str(&format!(
                    "require({}).prefetch({})",
                    id_of(async_require),
                    id_of(&call.specifier)
                ));
                last = call.call.end;
            }
        }
    }
    out.push_str(&src[last..]);
    out
}

/// Compress wrapped code and print it without whitespace or comments.
///
/// Names are not mangled, so `require` calls stay readable in the output.
/// `path` picks the syntax (TypeScript for `.ts`/`.tsx`) and labels errors.
pub fn minify(path: &Path, code: &str) -> BundleResult<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, source_type(path)).parse();
    if let Some(error) = ret.errors.first() {
        return Err(syntax_error(path, error));
    }

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: false,
        compress: CompressOptions::default(),
    };
    Minifier::new(options).build(&allocator, &mut program);

    let mut out = CodeGenerator::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: false,
            ..CodegenOptions::default()
        })
        .build(&program)
        .code;
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// JSON-quote a string, as the module system expects double quotes.
pub fn quote(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// Script syntax for `path`; JSX is accepted in plain JavaScript.
fn source_type(path: &Path) -> SourceType {
    match paths::extension(path) {
        "ts" => SourceType::default().with_typescript(true),
        "tsx" => SourceType::default().with_typescript(true).with_jsx(true),
        _ => SourceType::default().with_jsx(true),
    }
}

fn is_module_declaration(statement: &Statement<'_>) -> bool {
    matches!(
        statement,
        Statement::ImportDeclaration(_)
            | Statement::ExportAllDeclaration(_)
            | Statement::ExportDefaultDeclaration(_)
            | Statement::ExportNamedDeclaration(_)
    )
}

#[derive(Debug, Default)]
struct CallCollector {
    calls: Vec<DependencyCall>,
    /// First call whose argument is not a lone string literal.
    invalid: Option<Range<usize>>,
}

impl CallCollector {
    fn record(&mut self, kind: CallKind, call: Span, literal: Option<(String, Span)>) {
        match literal {
            Some((specifier, literal)) => self.calls.push(DependencyCall {
                kind,
                specifier,
                call: range(call),
                literal: range(literal),
            }),
            None => {
                self.invalid.get_or_insert(range(call));
            }
        }
    }
}

impl<'a> Visit<'a> for CallCollector {
    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &it.callee {
            let name = callee.name.as_str();
            let kind = if REQUIRE_CALLEES.contains(&name) {
                Some(CallKind::Require)
            } else if name == PREFETCH_CALLEE {
                Some(CallKind::Prefetch)
            } else {
                None
            };
            if let Some(kind) = kind {
                let literal = match it.arguments.len() {
                    1 => it.arguments.first().and_then(argument_literal),
                    _ => None,
                };
                self.record(kind, it.span, literal);
            }
        }
        walk::walk_call_expression(self, it);
    }

    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        let literal = if it.arguments.is_empty() {
            expression_literal(&it.source)
        } else {
            None
        };
        self.record(CallKind::Import, it.span, literal);
        walk::walk_import_expression(self, it);
    }
}

fn argument_literal(argument: &Argument<'_>) -> Option<(String, Span)> {
    match argument {
        Argument::StringLiteral(lit) => Some((lit.value.to_string(), lit.span)),
        Argument::TemplateLiteral(tpl) => template_literal(tpl),
        _ => None,
    }
}

fn expression_literal(expression: &Expression<'_>) -> Option<(String, Span)> {
    match expression {
        Expression::StringLiteral(lit) => Some((lit.value.to_string(), lit.span)),
        Expression::TemplateLiteral(tpl) => template_literal(tpl),
        _ => None,
    }
}

/// A template literal counts only without substitutions.
fn template_literal(tpl: &TemplateLiteral<'_>) -> Option<(String, Span)> {
    if !tpl.expressions.is_empty() {
        return None;
    }
    let quasi = tpl.quasis.first()?;
    let value = quasi.value.cooked.as_ref().unwrap_or(&quasi.value.raw);
    Some((value.to_string(), tpl.span))
}

fn range(span: Span) -> Range<usize> {
    span.start as usize..span.end as usize
}

fn syntax_error(path: &Path, error: &impl Display) -> BundleError {
    BundleError::Syntax {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

fn invalid_call(path: &Path, src: &str, call: Range<usize>) -> InvalidRequireCall {
    const MAX_CALL_LEN: usize = 120;

    let line = src[..call.start].matches('\n').count() + 1;
    let mut text = src[call.clone()].to_string();
    if text.len() > MAX_CALL_LEN {
        let mut cut = MAX_CALL_LEN;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("...");
    }
    InvalidRequireCall {
        path: path.to_path_buf(),
        line,
        call: text,
        src: NamedSource::new(path.display().to_string(), src.to_string()),
        span: SourceSpan::from((call.start, call.end - call.start)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specifiers(src: &str) -> Vec<String> {
        scan(Path::new("/tmp/pro/a.js"), src)
            .unwrap()
            .calls
            .into_iter()
            .map(|c| c.specifier)
            .collect()
    }

    #[test]
    fn test_collects_dependency_calls() {
        let src = r#"
            const a = require('./a');
            const b = _$$_IMPORT_DEFAULT("b");
            const c = _$$_IMPORT_ALL(`c`);
            import('./lazy').then(m => m);
            __prefetchImport('./later');
        "#;
        assert_eq!(specifiers(src), vec!["./a", "b", "c", "./lazy", "./later"]);
    }

    #[test]
    fn test_ignores_comments_strings_and_members() {
        let src = r#"
            // require('commented')
            /* require("block") */
            const s = "require('in-string')";
            const t = `require('in-template')`;
            const r = /require\('re'\)/g;
            foo.require('member');
            function require(x) {}
            if (typeof require === 'function') {}
            const real = require('real');
        "#;
        assert_eq!(specifiers(src), vec!["real"]);
    }

    #[test]
    fn test_template_substitution_is_code() {
        let src = "const x = `a ${require('inner')} b`;";
        assert_eq!(specifiers(src), vec!["inner"]);
    }

    #[test]
    fn test_division_is_not_a_regex() {
        let src = "const half = total / 2; const d = require('d'); const q = a / b / c;";
        assert_eq!(specifiers(src), vec!["d"]);
    }

    #[test]
    fn test_jsx_and_sloppy_sources_parse() {
        let jsx = "var Logo = require('./Logo');\nmodule.exports = () => <Logo size={2} />;\n";
        assert_eq!(specifiers(jsx), vec!["./Logo"]);

        let sloppy = "with (scope) { require('scoped'); }\nvar n = 010;\n";
        assert_eq!(specifiers(sloppy), vec!["scoped"]);
    }

    #[test]
    fn test_typescript_sources_parse() {
        let src = "const a: number = require('./a');\ninterface Props { size: number }\n";
        let scanned = scan(Path::new("/tmp/pro/a.ts"), src).unwrap();
        assert_eq!(scanned.calls.len(), 1);
        assert_eq!(scanned.calls[0].specifier, "./a");
    }

    #[test]
    fn test_syntax_error() {
        let err = scan(Path::new("/tmp/pro/a.js"), "var = require('x');").unwrap_err();
        assert!(matches!(err, BundleError::Syntax { .. }));
    }

    #[test]
    fn test_invalid_calls() {
        for src in [
            "require(name);",
            "require();",
            "require('a', 'b');",
            "require('a' + 'b');",
            "import(`./${x}`);",
        ] {
            match scan(Path::new("/tmp/pro/a.js"), src) {
                Err(BundleError::InvalidSpecifier(call)) => assert_eq!(call.line, 1),
                other => panic!("expected invalid call for {src:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_invalid_call_reports_line() {
        let src = "var a = 1;\n\nvar b = require(a);\n";
        let err = scan(Path::new("/tmp/pro/a.js"), src).unwrap_err();
        match err {
            BundleError::InvalidSpecifier(call) => {
                assert_eq!(call.line, 3);
                assert_eq!(call.call, "require(a)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_es_module_detection() {
        let path = Path::new("/tmp/pro/a.js");
        assert!(scan(path, "import React from 'react';").unwrap().es_module);
        assert!(scan(path, "export default 1;").unwrap().es_module);
        assert!(!scan(path, "const o = {import: 1, export: 2};").unwrap().es_module);
        assert!(!scan(path, "require('x');").unwrap().es_module);
        assert!(scan(path, "'use strict';\nrequire('x');").unwrap().strict);
    }

    #[test]
    fn test_rewrite_replaces_literals() {
        let src = "var a = require('./a');\nimport('./b');\n__prefetchImport('./c');\nrequire('ext');";
        let scanned = scan(Path::new("/tmp/pro/index.js"), src).unwrap();
        let ids: HashMap<String, String> = [
            ("./a", "src/a.js"),
            ("./b", "src/b.js"),
            ("./c", "src/c.js"),
            ("async", "lib/asyncRequire.js"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let out = rewrite(src, &scanned.calls, &ids, "async");
        assert_eq!(
            out,
            "var a = require(\"src/a.js\");\n\
             require(\"lib/asyncRequire.js\")(\"src/b.js\");\n\
             require(\"lib/asyncRequire.js\").prefetch(\"src/c.js\");\n\
             require(\"ext\");"
        );
    }

    #[test]
    fn test_minify() {
        let src = "// header\nvar  a = 1; /* note */ var b = 'x  y';\n\n\n  if (a) {\n    b = a;\n  }\n";
        let out = minify(Path::new("/tmp/pro/a.js"), src).unwrap();
        assert!(!out.contains("header"));
        assert!(!out.contains("note"));
        assert!(out.contains("x  y"));
        assert!(out.ends_with('\n'));
        assert!(out.len() < src.len());
    }

    #[test]
    fn test_minify_keeps_require_names() {
        let src = "__d(function(global, require, module, exports) {\n  var a = require(\"src/a.js\");\n  module.exports = a;\n},\"index.js\",null,\"index.js\");\n";
        let out = minify(Path::new("/tmp/pro/index.js"), src).unwrap();
        assert!(out.starts_with("__d(function("));
        assert!(out.contains("require(\"src/a.js\")"));
        assert!(out.contains("\"index.js\""));
    }

    #[test]
    fn test_minify_rejects_invalid_code() {
        let err = minify(Path::new("/tmp/pro/a.js"), "__d(function( {").unwrap_err();
        assert!(matches!(err, BundleError::Syntax { .. }));
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
    }
}
