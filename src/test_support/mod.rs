//! Test utilities for offpack unit tests.
//!
//! Project trees are written to a temporary directory that is removed when
//! the [`ProjectTree`] is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use offpack::test_support::ProjectTree;
//!
//! #[test]
//! fn test_example() {
//!     let project = ProjectTree::new()
//!         .file("index.js", "require('./run');")
//!         .file("run.js", "");
//!
//!     let entry = project.path("index.js");
//!     // Bundle from `entry`...
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub use fixtures::*;

/// A project laid out on disk for the duration of a test.
#[derive(Debug)]
pub struct ProjectTree {
    dir: TempDir,
    root: PathBuf,
}

impl ProjectTree {
    /// Create an empty project rooted at `<tmp>/pro`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let root = dir.path().join("pro");
        std::fs::create_dir_all(&root).expect("failed to create project root");
        ProjectTree { dir, root }
    }

    /// Add a text file, creating parent directories.
    pub fn file(self, rel: impl AsRef<Path>, content: &str) -> Self {
        self.bytes(rel, content.as_bytes())
    }

    /// Add a binary file, creating parent directories.
    pub fn bytes(self, rel: impl AsRef<Path>, content: &[u8]) -> Self {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, content).expect("failed to write file");
        self
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a project file.
    pub fn path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }

    /// A scratch directory next to the project, for outputs.
    pub fn out_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }
}

impl Default for ProjectTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Assertion helpers for testing.
pub mod assertions {
    use std::path::Path;

    /// Assert that an error message contains a substring.
    pub fn assert_error_contains<T: std::fmt::Debug>(
        result: Result<T, anyhow::Error>,
        substring: &str,
    ) {
        match result {
            Ok(v) => panic!("expected Err containing '{}', got Ok: {:?}", substring, v),
            Err(e) => {
                let msg = format!("{:#}", e);
                assert!(
                    msg.contains(substring),
                    "error '{}' does not contain '{}'",
                    msg,
                    substring
                );
            }
        }
    }

    /// Assert that a file exists and contains specific content.
    pub fn assert_file_contains(path: impl AsRef<Path>, content: &str) {
        let path = path.as_ref();
        let actual = std::fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("file not found: {}", path.display()));
        assert!(
            actual.contains(content),
            "file {} does not contain '{}'\nactual content:\n{}",
            path.display(),
            content,
            actual
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_tree_writes_files() {
        let project = ProjectTree::new()
            .file("index.js", "require('./a');")
            .file("src/a.js", "");

        assert!(project.path("index.js").is_file());
        assert!(project.path("src/a.js").is_file());
        assert!(project.root().ends_with("pro"));
        assert!(!project.out_dir().starts_with(project.root()));
    }
}

/// Index a project tree with the default configuration.
pub fn project_context(tree: &ProjectTree) -> crate::resolver::ProjectContext {
    crate::ops::bundle::index_project(tree.root(), &crate::util::config::ResolverConfig::default())
        .expect("failed to index project")
}
