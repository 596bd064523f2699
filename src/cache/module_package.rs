//! Module and package entities, memoised by absolute path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::once_map::OnceMap;
use crate::core::module::Module;
use crate::core::package::Package;
use crate::haste::HasteFs;
use crate::util::paths;

const PACKAGE_JSON: &str = "package.json";

/// Owns every `Module` and `Package` of one build.
#[derive(Debug)]
pub struct ModulePackageCache {
    haste: Arc<HasteFs>,
    main_fields: Arc<[String]>,
    modules: OnceMap<PathBuf, Arc<Module>>,
    packages: OnceMap<PathBuf, Arc<Package>>,
    module_packages: OnceMap<PathBuf, Option<PathBuf>>,
}

impl ModulePackageCache {
    pub fn new(haste: Arc<HasteFs>, main_fields: &[String]) -> Self {
        ModulePackageCache {
            haste,
            main_fields: main_fields.iter().cloned().collect(),
            modules: OnceMap::new(),
            packages: OnceMap::new(),
            module_packages: OnceMap::new(),
        }
    }

    /// The module for `path`, created on first request.
    pub fn get_module(&self, path: &Path) -> Arc<Module> {
        self.modules
            .get_or_compute(path.to_path_buf(), || Arc::new(Module::new(path)))
    }

    /// The package for a `package.json` path, created on first request.
    pub fn get_package(&self, path: &Path) -> Arc<Package> {
        self.packages.get_or_compute(path.to_path_buf(), || {
            Arc::new(Package::new(path, Arc::clone(&self.main_fields)))
        })
    }

    /// Nearest ancestor `package.json` of a module, by the file index.
    ///
    /// The walk starts at the module's directory and stops below the
    /// filesystem root.
    pub fn closest_package(&self, module_path: &Path) -> Option<PathBuf> {
        let mut dir = paths::parent(module_path);
        loop {
            let candidate = dir.join(PACKAGE_JSON);
            if self.haste.exists(&candidate) {
                return Some(candidate);
            }
            match dir.parent() {
                Some(parent) if parent.parent().is_some() => dir = parent,
                _ => return None,
            }
        }
    }

    /// The package enclosing a module. Memoised per module path; the package
    /// is registered under its own path as well.
    pub fn package_for_module(&self, module_path: &Path) -> Option<Arc<Package>> {
        let package_path = self
            .module_packages
            .get_or_compute(module_path.to_path_buf(), || {
                self.closest_package(module_path)
            })?;
        Some(self.get_package(&package_path))
    }
}
