//! Filesystem utilities.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::core::error::{BundleError, BundleResult};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> BundleResult<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| BundleError::fs(path, e))?;
    }
    Ok(())
}

/// Read a file to string.
pub fn read_to_string(path: &Path) -> BundleResult<String> {
    fs::read_to_string(path).map_err(|e| BundleError::fs(path, e))
}

/// Read a file to bytes.
pub fn read(path: &Path) -> BundleResult<Vec<u8>> {
    fs::read(path).map_err(|e| BundleError::fs(path, e))
}

/// Write bytes to a file, creating parent directories if needed.
pub fn write_bytes(path: &Path, contents: &[u8]) -> BundleResult<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).map_err(|e| BundleError::fs(path, e))
}

/// Write bytes to a temporary file next to `path`.
///
/// The file is removed when dropped; [`commit`] moves it to `path`.
pub fn stage_bytes(path: &Path, contents: &[u8]) -> BundleResult<NamedTempFile> {
    let dir = path
        .parent()
        .ok_or_else(|| BundleError::Invariant(format!("{} has no parent", path.display())))?;
    ensure_dir(dir)?;
    let mut file = NamedTempFile::new_in(dir).map_err(|e| BundleError::fs(dir, e))?;
    file.write_all(contents).map_err(|e| BundleError::fs(path, e))?;
    Ok(file)
}

/// Move a staged file into place.
pub fn commit(staged: NamedTempFile, path: &Path) -> BundleResult<()> {
    staged.persist(path).map_err(|e| BundleError::fs(path, e.error))?;
    Ok(())
}

/// Copy a file, creating the destination's parent directories.
pub fn copy_file(src: &Path, dst: &Path) -> BundleResult<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst).map_err(|e| BundleError::fs(src, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/base/main.bundle");

        write_bytes(&path, b"bundle").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"bundle");
    }

    #[test]
    fn test_staged_file_only_lands_on_commit() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/index.bundle");

        let staged = stage_bytes(&path, b"bundle").unwrap();
        assert!(!path.exists());
        commit(staged, &path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"bundle");

        drop(stage_bytes(&tmp.path().join("out/other.bundle"), b"x").unwrap());
        let names: Vec<_> = fs::read_dir(tmp.path().join("out"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("index.bundle")]);
    }

    #[test]
    fn test_stage_under_a_file_fails() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("blocker"), "").unwrap();
        let err = stage_bytes(&tmp.path().join("blocker/index.bundle"), b"x").unwrap_err();
        assert!(matches!(err, BundleError::Filesystem { .. }));
    }

    #[test]
    fn test_copy_file() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("img.png");
        let dst = tmp.path().join("assets/res/img.png");
        fs::write(&src, "png").unwrap();

        copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "png");
    }

    #[test]
    fn test_read_missing_is_filesystem_error() {
        let tmp = TempDir::new().unwrap();
        let err = read_to_string(&tmp.path().join("missing.js")).unwrap_err();
        assert!(matches!(err, BundleError::Filesystem { .. }));
    }
}
