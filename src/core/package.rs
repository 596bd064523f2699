//! Package - a `package.json` and the redirections it declares.
//!
//! A package's content is read lazily and cached until `invalidate` is
//! called. The redirect table is derived once per load from the configured
//! main fields (e.g. `react-native`, `browser`, `main`).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::core::error::{BundleError, BundleResult};
use crate::util::fs;
use crate::util::paths;

/// One entry of a redirect table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// Replace the specifier with another one.
    To(String),
    /// `false` in the manifest: the specifier must not be bundled.
    Excluded,
}

/// Outcome of asking a package to redirect a specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirected {
    Path(String),
    Excluded,
}

/// Specifier → replacement, merged across main fields.
pub type RedirectTable = HashMap<String, Redirect>;

/// Parsed manifest content.
#[derive(Debug)]
pub struct PackageContent {
    json: Value,
    redirects: Option<RedirectTable>,
}

impl PackageContent {
    fn load(path: &Path, main_fields: &[String]) -> BundleResult<Self> {
        let text = fs::read_to_string(path)?;
        let json: Value = serde_json::from_str(&text).map_err(|e| BundleError::Package {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let redirects = redirect_table(&json, main_fields);
        Ok(PackageContent { json, redirects })
    }

    /// The raw manifest.
    pub fn json(&self) -> &Value {
        &self.json
    }

    /// The merged redirect table, if any main field is an object.
    pub fn redirects(&self) -> Option<&RedirectTable> {
        self.redirects.as_ref()
    }
}

/// A package, identified by the absolute path of its `package.json`.
pub struct Package {
    path: PathBuf,
    dir: PathBuf,
    main_fields: Arc<[String]>,
    content: Mutex<Option<Arc<PackageContent>>>,
}

impl Package {
    /// Create a package for a manifest path. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>, main_fields: Arc<[String]>) -> Self {
        let path = paths::normalize(&path.into());
        let dir = paths::parent(&path).to_path_buf();
        Package {
            path,
            dir,
            main_fields,
            content: Mutex::new(None),
        }
    }

    /// Path of the `package.json`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the manifest.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load (once) and return the manifest content.
    pub fn content(&self) -> BundleResult<Arc<PackageContent>> {
        let mut guard = self.content.lock();
        if let Some(content) = guard.as_ref() {
            return Ok(Arc::clone(content));
        }
        let content = Arc::new(PackageContent::load(&self.path, &self.main_fields)?);
        *guard = Some(Arc::clone(&content));
        Ok(content)
    }

    /// Drop the cached content; the next access re-reads the manifest.
    pub fn invalidate(&self) {
        *self.content.lock() = None;
    }

    /// The `name` field.
    pub fn name(&self) -> BundleResult<Option<String>> {
        let content = self.content()?;
        Ok(content
            .json
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// The main entry path (without extension resolution), after redirection.
    pub fn main(&self) -> BundleResult<PathBuf> {
        let content = self.content()?;
        let mut main = self
            .main_fields
            .iter()
            .find_map(|field| content.json.get(field.as_str()).and_then(Value::as_str))
            .unwrap_or("index")
            .to_string();

        if let Some(table) = &content.redirects {
            let sibling = match main.strip_prefix("./") {
                Some(stripped) => stripped.to_string(),
                None => format!("./{}", main),
            };
            for variant in [main.clone(), sibling] {
                if let Some(Redirect::To(winner)) = lookup_variants(table, &variant) {
                    main = winner.clone();
                    break;
                }
            }
        }

        Ok(paths::join(&self.dir, main))
    }

    /// Redirect a specifier through the package's redirect table.
    ///
    /// Bare specifiers are looked up verbatim. Relative and absolute ones are
    /// keyed as `./<path relative to the package dir>`, and a hit is returned
    /// as an absolute path inside the package.
    pub fn redirect_require(&self, spec: &str) -> BundleResult<Redirected> {
        let content = self.content()?;
        let Some(table) = &content.redirects else {
            return Ok(Redirected::Path(spec.to_string()));
        };

        if !paths::is_relative_specifier(spec) && !paths::is_absolute_specifier(spec) {
            return Ok(match table.get(spec) {
                Some(Redirect::Excluded) => Redirected::Excluded,
                Some(Redirect::To(target)) => Redirected::Path(target.clone()),
                None => Redirected::Path(spec.to_string()),
            });
        }

        let absolute = paths::join(&self.dir, spec);
        let key = format!(
            "./{}",
            paths::to_slash(&paths::relative_path(&self.dir, &absolute))
        );
        Ok(match lookup_variants(table, &key) {
            Some(Redirect::Excluded) => Redirected::Excluded,
            Some(Redirect::To(target)) => {
                Redirected::Path(paths::to_slash(&paths::join(&self.dir, target)))
            }
            None => Redirected::Path(spec.to_string()),
        })
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package").field("path", &self.path).finish()
    }
}

/// Try `key`, `key.js`, `key.json`, then `key` without a `.js`/`.json` suffix.
fn lookup_variants<'a>(table: &'a RedirectTable, key: &str) -> Option<&'a Redirect> {
    if let Some(hit) = table.get(key) {
        return Some(hit);
    }
    if let Some(hit) = table.get(&format!("{}.js", key)) {
        return Some(hit);
    }
    if let Some(hit) = table.get(&format!("{}.json", key)) {
        return Some(hit);
    }
    let stripped = key
        .strip_suffix(".js")
        .or_else(|| key.strip_suffix(".json"))?;
    table.get(stripped)
}

/// Merge object-valued main fields; earlier fields take precedence.
fn redirect_table(json: &Value, main_fields: &[String]) -> Option<RedirectTable> {
    let objects: Vec<_> = main_fields
        .iter()
        .filter_map(|field| json.get(field.as_str()).and_then(Value::as_object))
        .collect();
    if objects.is_empty() {
        return None;
    }

    let mut table = RedirectTable::new();
    for object in objects.into_iter().rev() {
        for (key, value) in object {
            match value {
                Value::String(target) => {
                    table.insert(key.clone(), Redirect::To(target.clone()));
                }
                Value::Bool(false) => {
                    table.insert(key.clone(), Redirect::Excluded);
                }
                _ => {}
            }
        }
    }
    Some(table)
}
