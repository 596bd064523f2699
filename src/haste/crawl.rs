//! Filesystem crawler.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use regex::Regex;
use walkdir::WalkDir;

use crate::core::error::{BundleError, BundleResult};
use crate::util::paths;

/// Absolute path → modification time in milliseconds since the epoch.
pub type FileMap = BTreeMap<PathBuf, u64>;

/// Walk `roots` and record every regular file whose extension is allowed.
///
/// Entries matching `ignore` are pruned, directories included. Symbolic
/// links are never followed nor recorded. Siblings are visited in file name
/// order, and any read error aborts the crawl.
pub fn crawl<F>(roots: &[PathBuf], extensions: &[String], ignore: F) -> BundleResult<FileMap>
where
    F: Fn(&Path) -> bool,
{
    let mut files = FileMap::new();

    for root in roots {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !ignore(entry.path()));

        for entry in walker {
            let entry = entry.map_err(|e| walk_error(root, e))?;
            let file_type = entry.file_type();
            if file_type.is_symlink() || !file_type.is_file() {
                continue;
            }

            let ext = paths::extension(entry.path());
            if !extensions.iter().any(|allowed| allowed == ext) {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| walk_error(root, e))?;
            let mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);
            files.insert(entry.into_path(), mtime);
        }
    }

    tracing::debug!("crawled {} files", files.len());
    Ok(files)
}

fn walk_error(root: &Path, err: walkdir::Error) -> BundleError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message));
    BundleError::fs(path, source)
}

/// Path predicate built from a list of regular expressions.
///
/// Paths are matched in their `/`-separated form.
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    patterns: Vec<Regex>,
}

impl IgnoreMatcher {
    /// Compile the patterns; an invalid pattern is a configuration error.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> BundleResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| {
                    BundleError::Config(format!("invalid ignore pattern `{}`: {}", p.as_ref(), e))
                })
            })
            .collect::<BundleResult<Vec<_>>>()?;
        Ok(IgnoreMatcher { patterns })
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let path = paths::to_slash(path);
        self.patterns.iter().any(|re| re.is_match(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_crawl_filters_extensions_and_ignored_paths() {
        let tmp = TempDir::new().unwrap();
        let root1 = tmp.path().join("root1/demo");
        let root2 = tmp.path().join("root2/demo");

        for f in [
            "index.js",
            "package.json",
            "img1.jpg",
            "img2.png",
            ".babelrc",
            "src/bundle.js",
            "src/cache.js",
            "src/index.bundle",
        ] {
            touch(&root1.join(f));
        }
        for f in [
            "index.js",
            "package.json",
            "src/bundle.js",
            "src/cache/cache1",
            "src/cache/cacheDir/bundle.meta",
            "src/cache/cacheDir/genCache.js",
            "src/config/default.js",
            "src/config/default.json",
            "src/config/config.js",
        ] {
            touch(&root2.join(f));
        }
        #[cfg(unix)]
        std::os::unix::fs::symlink(root2.join("index.js"), root2.join("lindex.js")).unwrap();

        let ignore = IgnoreMatcher::new(&["src/config/.*"]).unwrap();
        let files = crawl(
            &[tmp.path().join("root1"), tmp.path().join("root2")],
            &exts(&["js", "json", "jpg", "png"]),
            |p| ignore.is_ignored(p),
        )
        .unwrap();

        for f in ["index.js", "package.json", "img1.jpg", "img2.png", "src/bundle.js", "src/cache.js"] {
            assert!(files.contains_key(&root1.join(f)), "missing {}", f);
        }
        for f in ["index.js", "package.json", "src/bundle.js", "src/cache/cacheDir/genCache.js"] {
            assert!(files.contains_key(&root2.join(f)), "missing {}", f);
        }

        assert!(!files.contains_key(&root1.join(".babelrc")));
        assert!(!files.contains_key(&root1.join("src/index.bundle")));
        assert!(!files.contains_key(&root2.join("src/cache/cache1")));
        assert!(!files.contains_key(&root2.join("src/config/default.js")));
        assert!(!files.contains_key(&root2.join("src/config/config.js")));
        assert!(!files.contains_key(&root2.join("lindex.js")));
        assert_eq!(files.len(), 10);
    }

    #[test]
    fn test_crawl_missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let result = crawl(&[tmp.path().join("nope")], &exts(&["js"]), |_| false);
        assert!(matches!(result, Err(BundleError::Filesystem { .. })));
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        assert!(matches!(
            IgnoreMatcher::new(&["("]),
            Err(BundleError::Config(_))
        ));
    }
}
