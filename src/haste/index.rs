//! In-memory view of the project tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::core::error::BundleResult;
use crate::core::platform::PlatformKey;
use crate::haste::crawl::{crawl, FileMap, IgnoreMatcher};
use crate::haste::short_name::{ModuleKind, ShortNameRules};
use crate::util::paths;

/// Snapshot of every crawled file. Never mutated after construction.
#[derive(Debug, Default)]
pub struct FileIndex {
    project_root: PathBuf,
    files: FileMap,
}

impl FileIndex {
    pub fn new(project_root: impl Into<PathBuf>, files: FileMap) -> Self {
        FileIndex {
            project_root: project_root.into(),
            files,
        }
    }

    /// Crawl `roots` and snapshot the result.
    pub fn crawl(
        project_root: &Path,
        roots: &[PathBuf],
        extensions: &[String],
        ignore: &IgnoreMatcher,
    ) -> BundleResult<Self> {
        let files = crawl(roots, extensions, |p| ignore.is_ignored(p))?;
        Ok(FileIndex::new(project_root, files))
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Whether a file was crawled.
    pub fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Modification time of a crawled file.
    pub fn mtime(&self, path: &Path) -> Option<u64> {
        self.files.get(path).copied()
    }

    /// All crawled paths, in lexicographic order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Path relative to the project root.
    pub fn relative_path(&self, path: &Path) -> PathBuf {
        paths::relative_path(&self.project_root, path)
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    path: PathBuf,
    kind: ModuleKind,
}

/// Short name → platform key → (path, kind).
#[derive(Debug, Default)]
pub struct ShortNameIndex {
    entries: HashMap<String, HashMap<PlatformKey, Candidate>>,
}

impl ShortNameIndex {
    /// Derive the index from a file snapshot.
    ///
    /// Short names are computed in parallel; insertion happens in path order
    /// so that the lexicographically first file wins a duplicate key.
    pub fn build(files: &FileIndex, rules: &ShortNameRules, platforms: &[String]) -> Self {
        let paths: Vec<&Path> = files.paths().collect();
        let named: Vec<(String, &Path)> = paths
            .par_iter()
            .filter_map(|path| rules.short_name(path).map(|name| (name, *path)))
            .collect();

        let mut index = ShortNameIndex::default();
        for (name, path) in named {
            let key = PlatformKey::detect(&paths::to_slash(path), platforms);
            index.insert(name, key, path.to_path_buf());
        }
        tracing::debug!("indexed {} short names", index.entries.len());
        index
    }

    /// Register a file; an already-registered (name, key) pair is kept.
    pub fn insert(&mut self, name: String, key: PlatformKey, path: PathBuf) {
        let kind = ModuleKind::of(&path);
        let by_platform = self.entries.entry(name).or_default();
        match by_platform.get(&key) {
            Some(existing) => {
                tracing::warn!(
                    "duplicate short name for platform {}: keeping {}, ignoring {}",
                    key,
                    existing.path.display(),
                    path.display()
                );
            }
            None => {
                by_platform.insert(key, Candidate { path, kind });
            }
        }
    }

    /// Module path for a short name: `platform`, then native, then generic.
    pub fn module_path(&self, name: &str, platform: &str) -> Option<&Path> {
        let by_platform = self.entries.get(name)?;
        let candidate = by_platform
            .get(&PlatformKey::from_token(platform))
            .or_else(|| by_platform.get(&PlatformKey::Native))
            .or_else(|| by_platform.get(&PlatformKey::Generic))?;
        (candidate.kind == ModuleKind::Module).then_some(candidate.path.as_path())
    }

    /// Package manifest path for a short name: `platform`, then generic.
    pub fn package_path(&self, name: &str, platform: &str) -> Option<&Path> {
        let by_platform = self.entries.get(name)?;
        let candidate = by_platform
            .get(&PlatformKey::from_token(platform))
            .or_else(|| by_platform.get(&PlatformKey::Generic))?;
        (candidate.kind == ModuleKind::Package).then_some(candidate.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// File index plus short-name index.
#[derive(Debug)]
pub struct HasteFs {
    files: FileIndex,
    short_names: ShortNameIndex,
}

impl HasteFs {
    pub fn new(files: FileIndex, short_names: ShortNameIndex) -> Self {
        HasteFs { files, short_names }
    }

    /// Crawl the roots and derive both indexes.
    pub fn build(
        project_root: &Path,
        roots: &[PathBuf],
        extensions: &[String],
        ignore: &IgnoreMatcher,
        rules: &ShortNameRules,
        platforms: &[String],
    ) -> BundleResult<Self> {
        let files = FileIndex::crawl(project_root, roots, extensions, ignore)?;
        let short_names = ShortNameIndex::build(&files, rules, platforms);
        tracing::info!(
            "indexed {} files, {} short names",
            files.len(),
            short_names.len()
        );
        Ok(HasteFs::new(files, short_names))
    }

    pub fn files(&self) -> &FileIndex {
        &self.files
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.files.exists(path)
    }

    pub fn module_path(&self, name: &str, platform: &str) -> Option<&Path> {
        self.short_names.module_path(name, platform)
    }

    pub fn package_path(&self, name: &str, platform: &str) -> Option<&Path> {
        self.short_names.package_path(name, platform)
    }
}
