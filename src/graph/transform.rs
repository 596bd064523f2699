//! The source transformer seam.
//!
//! The graph builder only needs a transformer to report a module's
//! dependency specifiers and, later, to substitute module identifiers for
//! them. [`ScanTransformer`] does both over the oxc AST.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::core::error::BundleResult;
use crate::graph::scan::{self, DependencyCall};
use crate::util::paths;

/// What a file is bundled as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// A source module wrapped into a `__d` definition.
    Module,
    /// An asset, bundled as its registration module.
    Asset,
    /// A JSON document, bundled as a module exporting it.
    Json,
    /// A polyfill, wrapped into an IIFE and run eagerly.
    Script,
}

impl ContentKind {
    /// Kind of a resolved dependency.
    pub fn of(path: &Path, is_asset: impl Fn(&Path) -> bool) -> Self {
        if paths::extension(path) == "json" {
            ContentKind::Json
        } else if is_asset(path) {
            ContentKind::Asset
        } else {
            ContentKind::Module
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Module => "module",
            ContentKind::Asset => "asset",
            ContentKind::Json => "json",
            ContentKind::Script => "script",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source text handed to a transformer.
#[derive(Debug, Clone, Copy)]
pub struct SourceUnit<'a> {
    pub path: &'a Path,
    pub kind: ContentKind,
    pub source: &'a str,
}

/// Result of transforming one source.
#[derive(Debug, Clone, Default)]
pub struct Transformed {
    /// Transformed code, before identifiers are substituted.
    pub code: String,
    /// Dependency specifiers in order of first appearance, without duplicates.
    pub dependencies: Vec<String>,
    calls: Vec<DependencyCall>,
    es_module: bool,
}

impl Transformed {
    /// A transformed source with nothing to rewrite.
    pub fn new(code: String, dependencies: Vec<String>) -> Self {
        Transformed {
            code,
            dependencies,
            ..Transformed::default()
        }
    }

    /// Dependency calls located in `code`.
    pub fn calls(&self) -> &[DependencyCall] {
        &self.calls
    }

    /// Whether the source is an ES module.
    pub fn is_es_module(&self) -> bool {
        self.es_module
    }
}

/// Turns module sources into wrappable code.
pub trait Transformer: Send + Sync {
    /// Transform a source and report its dependency specifiers.
    fn transform(&self, unit: &SourceUnit<'_>) -> BundleResult<Transformed>;

    /// Substitute module identifiers for dependency specifiers.
    ///
    /// `ids` maps every reported specifier either to a module identifier or
    /// to itself when the dependency is left unresolved on purpose.
    fn rewrite(&self, transformed: &Transformed, ids: &HashMap<String, String>)
        -> BundleResult<String>;

    /// Minify wrapped code. `path` is the file the code was built from.
    fn minify(&self, path: &Path, code: &str) -> BundleResult<String>;
}

/// Default transformer over the oxc parser.
///
/// Source text is kept as written: dependency literals are rewritten and
/// `import()` calls go through the async require module.
#[derive(Debug, Clone)]
pub struct ScanTransformer {
    async_require: String,
}

impl ScanTransformer {
    /// `async_require` is the specifier of the module backing `import()`.
    pub fn new(async_require: impl Into<String>) -> Self {
        ScanTransformer {
            async_require: async_require.into(),
        }
    }
}

impl Transformer for ScanTransformer {
    fn transform(&self, unit: &SourceUnit<'_>) -> BundleResult<Transformed> {
        if matches!(unit.kind, ContentKind::Json | ContentKind::Script) {
            return Ok(Transformed::new(unit.source.to_string(), Vec::new()));
        }

        let scanned = scan::scan(unit.path, unit.source)?;
        let mut dependencies: Vec<String> = Vec::new();
        for call in &scanned.calls {
            let mut add = |spec: &str| {
                if !dependencies.iter().any(|d| d == spec) {
                    dependencies.push(spec.to_string());
                }
            };
            add(&call.specifier);
            if call.kind != scan::CallKind::Require {
                add(&self.async_require);
            }
        }

        tracing::trace!(
            "{}: {} dependencies",
            unit.path.display(),
            dependencies.len()
        );
        Ok(Transformed {
            code: unit.source.to_string(),
            dependencies,
            calls: scanned.calls,
            es_module: scanned.es_module && !scanned.strict,
        })
    }

    fn rewrite(
        &self,
        transformed: &Transformed,
        ids: &HashMap<String, String>,
    ) -> BundleResult<String> {
        let code = scan::rewrite(&transformed.code, &transformed.calls, ids, &self.async_require);
        if transformed.es_module {
            return Ok(format!("\"use strict\";\n{}", code));
        }
        Ok(code)
    }

    fn minify(&self, path: &Path, code: &str) -> BundleResult<String> {
        scan::minify(path, code)
    }
}
