//! Bundle serializers.
//!
//! A build produces either a flat text bundle or an indexed binary
//! container, plus the base bundle when splitting.

pub mod flat;
pub mod indexed;
pub mod prelude;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{BundleError, BundleResult};
use crate::core::module::Module;

pub use indexed::{IndexEntry, IndexedBundle};

/// Output format of the business bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleFormat {
    /// Binary container with a module table.
    #[default]
    Indexed,
    /// Plain concatenation of module code.
    Flat,
}

impl BundleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleFormat::Indexed => "indexed",
            BundleFormat::Flat => "flat",
        }
    }
}

impl fmt::Display for BundleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BundleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "indexed" => Ok(BundleFormat::Indexed),
            "flat" => Ok(BundleFormat::Flat),
            other => Err(format!(
                "unknown bundle format `{}`, expected `indexed` or `flat`",
                other
            )),
        }
    }
}

/// Identifier and code of a compiled module.
pub(crate) fn compiled(module: &Module) -> BundleResult<(&str, &str)> {
    let id = module.id().ok_or_else(|| BundleError::IncompleteModule {
        path: module.path().to_path_buf(),
        missing: "identifier",
    })?;
    let code = module.code().ok_or_else(|| BundleError::IncompleteModule {
        path: module.path().to_path_buf(),
        missing: "code",
    })?;
    Ok((id, code))
}
