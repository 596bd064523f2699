//! Build error types and diagnostics.
//!
//! Every variant is fatal for the current build: the packager never retries
//! and never writes partial output.

use std::io;
use std::path::PathBuf;

use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Error raised while building a bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("unable to resolve `{to}` from `{}`", from.display())]
    Resolution { from: PathBuf, to: String },

    #[error(transparent)]
    InvalidSpecifier(Box<InvalidRequireCall>),

    #[error("syntax error in `{}`: {message}", path.display())]
    Syntax { path: PathBuf, message: String },

    #[error("invalid asset `{}`: {reason}", path.display())]
    AssetParse { path: PathBuf, reason: String },

    #[error("module `{}` is missing its {missing}", path.display())]
    IncompleteModule { path: PathBuf, missing: &'static str },

    #[error("I/O error on `{}`", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed package manifest `{}`: {reason}", path.display())]
    Package { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("malformed indexed bundle: {0}")]
    MalformedBundle(String),

    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

impl BundleError {
    /// Shorthand for a filesystem error at `path`.
    pub fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BundleError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BundleError::Resolution { from, to } => {
                Diagnostic::error(format!("unable to resolve module `{}`", to))
                    .with_location(from)
                    .with_context(format!("required from {}", from.display()))
                    .with_suggestion("Check that the file exists and the path is spelled correctly")
                    .with_suggestion(
                        "For packages, make sure the dependency is installed under node_modules",
                    )
            }

            BundleError::InvalidSpecifier(call) => {
                Diagnostic::error("invalid dependency call".to_string())
                    .with_location(&call.path)
                    .with_context(format!("found `{}`", call.call))
                    .with_suggestion("Dependency calls take exactly one string literal argument")
            }

            BundleError::Syntax { path, message } => {
                Diagnostic::error(format!("syntax error: {}", message))
                    .with_location(path)
                    .with_suggestion("Production builds also parse the wrapped module, so ES module syntax must be compiled to CommonJS first")
            }

            BundleError::AssetParse { path, reason } => {
                Diagnostic::error(format!("invalid asset: {}", reason)).with_location(path)
            }

            BundleError::IncompleteModule { path, missing } => {
                Diagnostic::error(format!("module was never compiled (missing {})", missing))
                    .with_location(path)
                    .with_context("the module is listed in the bundle but was not processed")
            }

            BundleError::Filesystem { path, source } => {
                Diagnostic::error(format!("filesystem error: {}", source)).with_location(path)
            }

            BundleError::Package { path, reason } => {
                Diagnostic::error(format!("malformed package.json: {}", reason))
                    .with_location(path)
                    .with_suggestion("Fix the JSON syntax of the package manifest")
            }

            BundleError::Config(message) => Diagnostic::error(format!(
                "invalid configuration: {}",
                message
            )),

            BundleError::MalformedBundle(message) => {
                Diagnostic::error(format!("malformed indexed bundle: {}", message))
            }

            BundleError::Invariant(message) => Diagnostic::error(message.clone())
                .with_suggestion("This is a packager bug; please report it"),
        }
    }
}

impl From<InvalidRequireCall> for BundleError {
    fn from(err: InvalidRequireCall) -> Self {
        BundleError::InvalidSpecifier(Box::new(err))
    }
}

/// A `require`/`import` call whose argument is not a single string literal.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("invalid call at line {line}: {call}")]
#[diagnostic(
    code(offpack::graph::invalid_specifier),
    help("dependency calls must have exactly one string literal argument")
)]
pub struct InvalidRequireCall {
    pub path: PathBuf,
    pub line: usize,
    pub call: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: SourceSpan,
}

pub type BundleResult<T> = std::result::Result<T, BundleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_diagnostic() {
        let err = BundleError::Resolution {
            from: PathBuf::from("/tmp/pro/index.js"),
            to: "missing-pkg".to_string(),
        };

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("unable to resolve module `missing-pkg`"));
        assert!(output.contains("/tmp/pro/index.js"));
        assert!(output.contains("node_modules"));
    }

    #[test]
    fn test_syntax_diagnostic() {
        let err = BundleError::Syntax {
            path: PathBuf::from("/tmp/pro/a.js"),
            message: "Unexpected token".to_string(),
        };
        assert_eq!(err.to_string(), "syntax error in `/tmp/pro/a.js`: Unexpected token");
        assert!(err.to_diagnostic().format(false).contains("/tmp/pro/a.js"));
    }

    #[test]
    fn test_incomplete_module_message() {
        let err = BundleError::IncompleteModule {
            path: PathBuf::from("/tmp/pro/a.js"),
            missing: "code",
        };
        assert_eq!(err.to_string(), "module `/tmp/pro/a.js` is missing its code");
    }
}
