//! What the resolver needs to know about the project.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{AssetResolutionCache, ModulePackageCache};
use crate::core::error::BundleResult;
use crate::core::package::Package;
use crate::haste::HasteFs;
use crate::util::paths;

/// Collaborators of the resolution algorithm.
pub trait ResolutionContext: Send + Sync {
    /// Source extensions, in resolution priority order.
    fn source_exts(&self) -> &[String];

    /// Whether a regular file exists at `path`.
    fn does_file_exist(&self, path: &Path) -> bool;

    /// Module registered under a short name.
    fn module_path(&self, name: &str, platform: &str) -> Option<PathBuf>;

    /// `package.json` registered under a short name.
    fn package_path(&self, name: &str, platform: &str) -> Option<PathBuf>;

    /// Real file names in `dir` satisfying an asset request.
    fn resolve_asset(
        &self,
        dir: &Path,
        asset_name: &str,
        platform: &str,
    ) -> BundleResult<Option<Vec<String>>>;

    /// Main entry (without extension resolution) of a package.
    fn package_main_path(&self, package_json: &Path) -> BundleResult<PathBuf>;

    /// Whether a file name has an asset extension.
    fn is_asset_file(&self, path: &Path) -> bool;

    /// Package enclosing a path, used for redirections.
    fn package_for_path(&self, path: &Path) -> Option<Arc<Package>>;
}

/// The production context, backed by the project's file index and caches.
#[derive(Debug)]
pub struct ProjectContext {
    haste: Arc<HasteFs>,
    cache: ModulePackageCache,
    assets: AssetResolutionCache,
    source_exts: Vec<String>,
    asset_exts: HashSet<String>,
    image_exts: HashSet<String>,
}

/// Extensions and platforms a [`ProjectContext`] is configured with.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    pub source_exts: Vec<String>,
    pub asset_exts: Vec<String>,
    pub image_exts: Vec<String>,
    pub platforms: Vec<String>,
    pub main_fields: Vec<String>,
}

impl ProjectContext {
    pub fn new(haste: Arc<HasteFs>, options: &ContextOptions) -> Self {
        let cache = ModulePackageCache::new(Arc::clone(&haste), &options.main_fields);
        let assets =
            AssetResolutionCache::new(haste.files(), &options.asset_exts, &options.platforms);
        ProjectContext {
            haste,
            cache,
            assets,
            source_exts: options.source_exts.clone(),
            asset_exts: options.asset_exts.iter().cloned().collect(),
            image_exts: options.image_exts.iter().cloned().collect(),
        }
    }

    pub fn haste(&self) -> &HasteFs {
        &self.haste
    }

    pub fn cache(&self) -> &ModulePackageCache {
        &self.cache
    }

    pub fn assets(&self) -> &AssetResolutionCache {
        &self.assets
    }

    /// Whether a file name has an image extension.
    pub fn is_image_file(&self, path: &Path) -> bool {
        self.image_exts.contains(paths::extension(path))
    }
}

impl ResolutionContext for ProjectContext {
    fn source_exts(&self) -> &[String] {
        &self.source_exts
    }

    fn does_file_exist(&self, path: &Path) -> bool {
        self.haste.exists(path)
    }

    fn module_path(&self, name: &str, platform: &str) -> Option<PathBuf> {
        self.haste.module_path(name, platform).map(Path::to_path_buf)
    }

    fn package_path(&self, name: &str, platform: &str) -> Option<PathBuf> {
        self.haste.package_path(name, platform).map(Path::to_path_buf)
    }

    fn resolve_asset(
        &self,
        dir: &Path,
        asset_name: &str,
        platform: &str,
    ) -> BundleResult<Option<Vec<String>>> {
        if !self.assets.has_directory(dir) {
            return Ok(None);
        }
        self.assets.resolve(dir, asset_name, platform)
    }

    fn package_main_path(&self, package_json: &Path) -> BundleResult<PathBuf> {
        self.cache.get_package(package_json).main()
    }

    fn is_asset_file(&self, path: &Path) -> bool {
        self.asset_exts.contains(paths::extension(path))
    }

    fn package_for_path(&self, path: &Path) -> Option<Arc<Package>> {
        self.cache.package_for_module(path)
    }
}
