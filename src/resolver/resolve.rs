//! Module resolution.
//!
//! A specifier is resolved, in order, as:
//! 1. a relative or absolute path;
//! 2. a bare name redirected by the requesting module's package;
//! 3. a short name, or a path below a short-named package;
//! 4. a package found in an ancestor `node_modules` directory.
//!
//! Files are tried with the platform, `native` and plain infixes for every
//! source extension; assets go through the asset cache.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::core::error::{BundleError, BundleResult};
use crate::core::package::Redirected;
use crate::resolver::context::ResolutionContext;
use crate::util::paths;

const NODE_MODULES: &str = "node_modules";
const PACKAGE_JSON: &str = "package.json";
const NATIVE_INFIX: &str = ".native";

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The specifier refers to this file.
    Resolved(PathBuf),
    /// The specifier was excluded by a package redirect and stays as-is.
    PassThrough,
}

/// Resolve `to`, required from the module at `from`, for `platform`.
pub fn resolve<C>(ctx: &C, from: &Path, to: &str, platform: &str) -> BundleResult<Resolution>
where
    C: ResolutionContext + ?Sized,
{
    let resolution = Resolver { ctx, from, to, platform }.run()?;
    tracing::trace!("resolved `{}` from {} to {:?}", to, from.display(), resolution);
    Ok(resolution)
}

struct Resolver<'a, C: ?Sized> {
    ctx: &'a C,
    from: &'a Path,
    to: &'a str,
    platform: &'a str,
}

impl<C> Resolver<'_, C>
where
    C: ResolutionContext + ?Sized,
{
    fn run(&self) -> BundleResult<Resolution> {
        if is_path_specifier(self.to) {
            return self.resolve_module_path(self.to);
        }

        let real_name = match self.redirect(self.from, self.to) {
            Redirected::Excluded => return Ok(Resolution::PassThrough),
            Redirected::Path(name) => name,
        };

        if is_path_specifier(&real_name) {
            let origin = self.origin_package_dir();
            let target = paths::join(&origin, &real_name);
            return self.resolve_module_path(&paths::to_slash(&target));
        }

        let normalized = paths::normalize_specifier(&real_name);
        if let Some(path) = self.resolve_short_name(&normalized)? {
            return Ok(Resolution::Resolved(path));
        }

        let mut dir = paths::parent(self.from);
        while let Some(parent) = dir.parent() {
            let candidate = dir.join(NODE_MODULES).join(&real_name);
            dir = parent;
            let redirected = match self.redirect(&candidate, &paths::to_slash(&candidate)) {
                Redirected::Excluded => continue,
                Redirected::Path(path) if path.is_empty() => continue,
                Redirected::Path(path) => path,
            };
            if let Some(path) = self.resolve_file_or_dir(Path::new(&redirected))? {
                return Ok(Resolution::Resolved(path));
            }
        }

        Err(self.unresolvable())
    }

    /// Relative or absolute specifier, after redirection by the enclosing
    /// package.
    fn resolve_module_path(&self, to: &str) -> BundleResult<Resolution> {
        let module_path = if paths::is_absolute_specifier(to) {
            paths::normalize(Path::new(to))
        } else {
            paths::join(paths::parent(self.from), to)
        };

        let redirected = match self.redirect(&module_path, &paths::to_slash(&module_path)) {
            Redirected::Excluded => return Ok(Resolution::PassThrough),
            Redirected::Path(path) => path,
        };
        match self.resolve_file_or_dir(Path::new(&redirected))? {
            Some(path) => Ok(Resolution::Resolved(path)),
            None => Err(self.unresolvable()),
        }
    }

    /// Short-name lookup, then a sub-path below a short-named package.
    fn resolve_short_name(&self, name: &str) -> BundleResult<Option<PathBuf>> {
        if let Some(path) = self.ctx.module_path(name, self.platform) {
            return Ok(Some(path));
        }

        let mut package_name = name;
        let mut package_json = None;
        while package_json.is_none() {
            match package_name.rfind('/') {
                Some(idx) if idx > 0 => package_name = &package_name[..idx],
                _ => break,
            }
            package_json = self.ctx.package_path(package_name, self.platform);
        }
        let Some(package_json) = package_json else {
            return Ok(None);
        };

        let sub_path = &name[package_name.len() + 1..];
        let candidate = paths::join(paths::parent(&package_json), sub_path);
        match self.resolve_file_or_dir(&candidate)? {
            Some(path) => Ok(Some(path)),
            None => Err(self.unresolvable()),
        }
    }

    fn resolve_file_or_dir(&self, module_path: &Path) -> BundleResult<Option<PathBuf>> {
        let dir = paths::parent(module_path);
        let file_name = paths::file_name(module_path);
        if let Some(path) = self.resolve_file(dir, file_name)? {
            return Ok(Some(path));
        }
        self.resolve_dir(module_path)
    }

    fn resolve_file(&self, dir: &Path, file_name: &str) -> BundleResult<Option<PathBuf>> {
        if self.ctx.is_asset_file(Path::new(file_name)) {
            return self.resolve_asset_file(dir, file_name);
        }
        let prefix = dir.join(file_name).into_os_string();
        Ok(self.resolve_source_file(&prefix))
    }

    /// Lexicographically first real file among the asset's candidates.
    fn resolve_asset_file(&self, dir: &Path, file_name: &str) -> BundleResult<Option<PathBuf>> {
        let Some(names) = self.ctx.resolve_asset(dir, file_name, self.platform)? else {
            return Ok(None);
        };
        Ok(names.iter().map(|name| dir.join(name)).min())
    }

    /// The bare prefix first (with `.native` and without), then every source
    /// extension with the platform, `.native` and no infix.
    fn resolve_source_file(&self, prefix: &OsString) -> Option<PathBuf> {
        if let Some(path) = self.try_infixes(prefix, "", None) {
            return Some(path);
        }
        self.ctx.source_exts().iter().find_map(|ext| {
            self.try_infixes(prefix, &format!(".{}", ext), Some(self.platform))
        })
    }

    fn try_infixes(&self, prefix: &OsString, ext: &str, platform: Option<&str>) -> Option<PathBuf> {
        let platform_infix = platform
            .filter(|p| !p.is_empty())
            .map(|p| format!(".{}", p));
        let found = platform_infix
            .as_deref()
            .into_iter()
            .chain([NATIVE_INFIX, ""])
            .find_map(|infix| {
                let mut candidate = prefix.clone();
                candidate.push(infix);
                candidate.push(ext);
                let candidate = PathBuf::from(candidate);
                self.ctx.does_file_exist(&candidate).then_some(candidate)
            });
        found
    }

    fn resolve_dir(&self, dir: &Path) -> BundleResult<Option<PathBuf>> {
        let package_json = dir.join(PACKAGE_JSON);
        if self.ctx.does_file_exist(&package_json) {
            return self.resolve_package(&package_json);
        }
        self.resolve_file(dir, "index")
    }

    /// The package's main as a file, else `<main>/index`.
    fn resolve_package(&self, package_json: &Path) -> BundleResult<Option<PathBuf>> {
        let main = self.ctx.package_main_path(package_json)?;
        if let Some(path) = self.resolve_file(paths::parent(&main), paths::file_name(&main))? {
            return Ok(Some(path));
        }
        self.resolve_file(&main, "index")
    }

    /// Redirect `spec` through the package enclosing `owner`.
    ///
    /// A package whose manifest cannot be read leaves the specifier as-is.
    fn redirect(&self, owner: &Path, spec: &str) -> Redirected {
        let Some(package) = self.ctx.package_for_path(owner) else {
            return Redirected::Path(spec.to_string());
        };
        match package.redirect_require(spec) {
            Ok(redirected) => redirected,
            Err(err) => {
                tracing::warn!("ignoring redirections of {}: {}", package.path().display(), err);
                Redirected::Path(spec.to_string())
            }
        }
    }

    /// Directory of the package `from` belongs to: its last
    /// `node_modules/<pkg>` (or `node_modules/@scope/pkg`) segment, else its
    /// closest package, else its own directory.
    fn origin_package_dir(&self) -> PathBuf {
        let components: Vec<Component<'_>> = self.from.components().collect();
        let last_dir = components.len().saturating_sub(1);
        let node_modules = components[..last_dir]
            .iter()
            .rposition(|c| c.as_os_str() == NODE_MODULES);

        if let Some(idx) = node_modules {
            let mut end = idx + 1;
            if end < last_dir {
                let scoped = components[end].as_os_str().to_string_lossy().starts_with('@');
                if scoped && end + 1 < last_dir {
                    end += 1;
                }
                return components[..=end].iter().collect();
            }
        }

        match self.ctx.package_for_path(self.from) {
            Some(package) => package.dir().to_path_buf(),
            None => paths::parent(self.from).to_path_buf(),
        }
    }

    fn unresolvable(&self) -> BundleError {
        BundleError::Resolution {
            from: self.from.to_path_buf(),
            to: self.to.to_string(),
        }
    }
}

fn is_path_specifier(spec: &str) -> bool {
    paths::is_relative_specifier(spec) || paths::is_absolute_specifier(spec)
}
