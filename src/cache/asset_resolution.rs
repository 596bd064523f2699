//! Per-directory asset lookup.
//!
//! `require('./foo.png')` may mean `foo@2x.png`, `foo.ios.png` and so on.
//! For each directory, the first lookup parses every file name once and
//! records which real files can stand for each logical asset name.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::path::try_parse;
use crate::cache::once_map::OnceMap;
use crate::core::error::{BundleError, BundleResult};
use crate::haste::FileIndex;
use crate::util::paths;

/// A real file that can satisfy a logical asset request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCandidate {
    pub file_name: String,
    /// `None` when the candidate suits any platform.
    pub platform: Option<String>,
}

type CandidatesByName = HashMap<String, Vec<AssetCandidate>>;

#[derive(Debug)]
pub struct AssetResolutionCache {
    file_names_by_dir: HashMap<PathBuf, Vec<String>>,
    asset_exts: HashSet<String>,
    platforms: Vec<String>,
    info_by_dir: OnceMap<PathBuf, Arc<CandidatesByName>>,
}

impl AssetResolutionCache {
    pub fn new(files: &FileIndex, asset_exts: &[String], platforms: &[String]) -> Self {
        let mut file_names_by_dir: HashMap<PathBuf, Vec<String>> = HashMap::new();
        for path in files.paths() {
            file_names_by_dir
                .entry(paths::parent(path).to_path_buf())
                .or_default()
                .push(paths::file_name(path).to_string());
        }
        AssetResolutionCache {
            file_names_by_dir,
            asset_exts: asset_exts.iter().cloned().collect(),
            platforms: platforms.to_vec(),
            info_by_dir: OnceMap::new(),
        }
    }

    /// Whether any file of `dir` was crawled.
    pub fn has_directory(&self, dir: &Path) -> bool {
        self.file_names_by_dir.contains_key(dir)
    }

    /// Crawled file names of a directory, in path order.
    pub fn file_names(&self, dir: &Path) -> Option<&[String]> {
        self.file_names_by_dir.get(dir).map(Vec::as_slice)
    }

    /// Real file names in `dir` that satisfy `asset_name` on `platform`.
    ///
    /// Returns `Ok(None)` when the name is unknown in the directory; a
    /// directory that was never crawled is an error.
    pub fn resolve(
        &self,
        dir: &Path,
        asset_name: &str,
        platform: &str,
    ) -> BundleResult<Option<Vec<String>>> {
        let by_name = self
            .info_by_dir
            .get_or_try_compute(dir.to_path_buf(), || self.find_assets(dir))?;
        let Some(candidates) = by_name.get(asset_name) else {
            return Ok(None);
        };
        Ok(Some(
            candidates
                .iter()
                .filter(|c| c.platform.as_deref().map_or(true, |p| p == platform))
                .map(|c| c.file_name.clone())
                .collect(),
        ))
    }

    fn find_assets(&self, dir: &Path) -> BundleResult<Arc<CandidatesByName>> {
        let file_names = self.file_names(dir).ok_or_else(|| BundleError::AssetParse {
            path: dir.to_path_buf(),
            reason: "asset directory was never indexed".to_string(),
        })?;

        let mut by_name = CandidatesByName::new();
        for file_name in file_names {
            let Some(parts) = try_parse(file_name, &self.platforms) else {
                continue;
            };
            if !self.asset_exts.contains(&parts.kind) {
                continue;
            }

            if let Some(platform) = &parts.platform {
                // Also reachable as `name.<platform>.type`, for any platform.
                let with_platform = format!("{}.{}.{}", parts.name, platform, parts.kind);
                by_name.entry(with_platform).or_default().push(AssetCandidate {
                    file_name: file_name.clone(),
                    platform: None,
                });
            }
            by_name.entry(parts.asset_name).or_default().push(AssetCandidate {
                file_name: file_name.clone(),
                platform: parts.platform,
            });
        }
        tracing::debug!("indexed {} assets in {}", by_name.len(), dir.display());
        Ok(Arc::new(by_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haste::FileMap;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn cache() -> AssetResolutionCache {
        let files: FileMap = [
            "/tmp/pro/img/img.png",
            "/tmp/pro/img/img@2x.png",
            "/tmp/pro/img/img@2x.android.png",
            "/tmp/pro/img/img@3x.ios.png",
            "/tmp/pro/img/img.js",
            "/tmp/pro/index.js",
        ]
        .iter()
        .map(|p| (PathBuf::from(p), 0))
        .collect();
        AssetResolutionCache::new(
            &FileIndex::new("/tmp/pro", files),
            &strings(&["png", "jpg"]),
            &strings(&["ios", "android"]),
        )
    }

    #[test]
    fn test_resolve_filters_by_platform() {
        let cache = cache();
        let dir = Path::new("/tmp/pro/img");

        assert_eq!(
            cache.resolve(dir, "img.png", "android").unwrap(),
            Some(strings(&["img.png", "img@2x.android.png", "img@2x.png"]))
        );
        assert_eq!(
            cache.resolve(dir, "img.png", "ios").unwrap(),
            Some(strings(&["img.png", "img@2x.png", "img@3x.ios.png"]))
        );
    }

    #[test]
    fn test_platform_segment_name_is_platform_agnostic() {
        let cache = cache();
        let dir = Path::new("/tmp/pro/img");

        assert_eq!(
            cache.resolve(dir, "img.ios.png", "android").unwrap(),
            Some(strings(&["img@3x.ios.png"]))
        );
    }

    #[test]
    fn test_unknown_names_and_directories() {
        let cache = cache();

        assert_eq!(cache.resolve(Path::new("/tmp/pro/img"), "img.js", "ios").unwrap(), None);
        assert_eq!(cache.resolve(Path::new("/tmp/pro"), "logo.png", "ios").unwrap(), None);
        assert!(!cache.has_directory(Path::new("/tmp/pro/missing")));
        assert!(matches!(
            cache.resolve(Path::new("/tmp/pro/missing"), "a.png", "ios"),
            Err(BundleError::AssetParse { .. })
        ));
    }
}
