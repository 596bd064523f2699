//! Short-name (haste) derivation.
//!
//! A file has a short name when it is a `package.json` (its `name` field) or
//! a `.js` / `.js.flow` source inside a whitelisted directory of the runtime
//! package (its reduced basename, e.g. `Image` for `Image.ios.js`).

use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::Value;

use crate::core::error::{BundleError, BundleResult};
use crate::util::{fs, paths};

/// Top-level directories of the runtime package that carry short names.
const WHITELISTED_PREFIXES: &[&str] = &["IntegrationTests", "Libraries", "ReactAndroid", "RNTester"];

/// Sub-paths of the runtime package that never carry short names.
const BLACKLISTED_PATTERNS: &[&str] = &[
    r"(^|.*/)__(mocks|tests)__/",
    r"^Libraries/Animated/src/polyfills/",
    r"^Libraries/Renderer/fb/",
];

const PACKAGE_JSON: &str = "package.json";

/// What an indexed file stands for in the short-name index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Module,
    Package,
}

impl ModuleKind {
    /// `Package` iff the file is named exactly `package.json`.
    pub fn of(path: &Path) -> Self {
        if paths::file_name(path) == PACKAGE_JSON {
            ModuleKind::Package
        } else {
            ModuleKind::Module
        }
    }
}

/// Rules deciding which files get a short name.
#[derive(Debug, Clone)]
pub struct ShortNameRules {
    runtime_dir: PathBuf,
    blacklist: Vec<Regex>,
}

impl ShortNameRules {
    /// Rules for a project whose runtime package lives at
    /// `<project_root>/node_modules/<runtime_package>`.
    pub fn new(project_root: &Path, runtime_package: &str) -> BundleResult<Self> {
        let blacklist = BLACKLISTED_PATTERNS
            .iter()
            .map(|p| Regex::new(p).map_err(|e| BundleError::Invariant(e.to_string())))
            .collect::<BundleResult<Vec<_>>>()?;
        Ok(ShortNameRules {
            runtime_dir: project_root.join("node_modules").join(runtime_package),
            blacklist,
        })
    }

    /// Short name of a file, or `None` if it has none.
    ///
    /// A `package.json` that cannot be read or parsed is skipped with a
    /// warning rather than failing the index.
    pub fn short_name(&self, path: &Path) -> Option<String> {
        match ModuleKind::of(path) {
            ModuleKind::Package => package_name(path),
            ModuleKind::Module => {
                if !self.is_haste_path(path) {
                    return None;
                }
                reduce_name(paths::file_name(path))
            }
        }
    }

    fn is_haste_path(&self, path: &Path) -> bool {
        let name = paths::file_name(path);
        if !name.ends_with(".js") && !name.ends_with(".js.flow") {
            return false;
        }
        let Ok(sub_path) = path.strip_prefix(&self.runtime_dir) else {
            return false;
        };
        let sub_path = paths::to_slash(sub_path);
        if self.blacklist.iter().any(|re| re.is_match(&sub_path)) {
            return false;
        }
        WHITELISTED_PREFIXES
            .iter()
            .any(|prefix| sub_path.starts_with(prefix))
    }
}

fn package_name(path: &Path) -> Option<String> {
    let parsed = fs::read_to_string(path).and_then(|text| {
        serde_json::from_str::<Value>(&text).map_err(|e| BundleError::Package {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    });
    match parsed {
        Ok(json) => json
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
        Err(err) => {
            tracing::warn!("skipping package manifest {}: {}", path.display(), err);
            None
        }
    }
}

/// `Image.ios.js` → `Image`, `Text.js.flow` → `Text`.
fn reduce_name(file_name: &str) -> Option<String> {
    if file_name.is_empty()
        || !file_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '$' | '_' | '.' | '-'))
    {
        return None;
    }
    let name = file_name
        .strip_suffix(".js.flow")
        .or_else(|| file_name.strip_suffix(".js"))
        .unwrap_or(file_name);
    let name = [".android", ".ios", ".native"]
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
