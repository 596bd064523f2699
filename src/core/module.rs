//! Module - one source file taking part in a build.

use std::fmt;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use crate::core::error::{BundleError, BundleResult};

/// A module in the dependency graph, identified by its absolute path.
///
/// The identifier, compiled code and encoded buffer are each written exactly
/// once during a build.
#[derive(Debug)]
pub struct Module {
    path: PathBuf,
    id: OnceCell<String>,
    code: OnceCell<String>,
    encoded: OnceCell<Vec<u8>>,
}

impl Module {
    /// Create a module for an absolute path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Module {
            path: path.into(),
            id: OnceCell::new(),
            code: OnceCell::new(),
            encoded: OnceCell::new(),
        }
    }

    /// Absolute path of the module.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Assigned module identifier, if compiled.
    pub fn id(&self) -> Option<&str> {
        self.id.get().map(String::as_str)
    }

    /// Compiled code, if compiled.
    pub fn code(&self) -> Option<&str> {
        self.code.get().map(String::as_str)
    }

    /// Null-terminated code bytes, once serialized into an indexed bundle.
    pub fn encoded(&self) -> Option<&[u8]> {
        self.encoded.get().map(Vec::as_slice)
    }

    /// Record the compiled output of the module.
    pub fn set_compiled(&self, id: String, code: String) -> BundleResult<()> {
        self.id
            .set(id)
            .map_err(|_| self.already_set("identifier"))?;
        self.code.set(code).map_err(|_| self.already_set("code"))
    }

    /// Encode the compiled code as a null-terminated buffer, once.
    pub fn encode(&self) -> BundleResult<&[u8]> {
        let code = self.code().ok_or_else(|| BundleError::IncompleteModule {
            path: self.path.clone(),
            missing: "code",
        })?;
        let bytes = self.encoded.get_or_init(|| {
            let mut buf = Vec::with_capacity(code.len() + 1);
            buf.extend_from_slice(code.as_bytes());
            buf.push(0);
            buf
        });
        Ok(bytes)
    }

    fn already_set(&self, what: &'static str) -> BundleError {
        BundleError::Invariant(format!(
            "{} of `{}` assigned twice",
            what,
            self.path.display()
        ))
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
