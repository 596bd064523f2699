//! Lexical path helpers.
//!
//! Module specifiers use `/` separators regardless of host, and resolution
//! works on paths that may not exist yet, so nothing here touches the disk.

use std::path::{Component, Path, PathBuf};

/// `./x`, `../x`, `.` and `..` are relative specifiers.
pub fn is_relative_specifier(spec: &str) -> bool {
    spec == "."
        || spec == ".."
        || spec.starts_with("./")
        || spec.starts_with("../")
}

/// Whether a specifier is an absolute filesystem path.
pub fn is_absolute_specifier(spec: &str) -> bool {
    Path::new(spec).is_absolute()
}

/// Lexically normalise a path: drop `.` components and fold `..`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Join and normalise.
pub fn join(base: &Path, rel: impl AsRef<Path>) -> PathBuf {
    normalize(&base.join(rel))
}

/// Normalise a module name the way specifiers are compared: `/` separated,
/// no `.` segments, no trailing slash.
pub fn normalize_specifier(spec: &str) -> String {
    let normalized = normalize(Path::new(spec));
    let mut out = to_slash(&normalized);
    while out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Render a path with `/` separators.
pub fn to_slash(path: &Path) -> String {
    let s = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// File name of a path as a string, empty when absent.
pub fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Extension after the last dot of the file name, without the dot.
pub fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

/// Parent directory, or the path itself for roots.
pub fn parent(path: &Path) -> &Path {
    path.parent().unwrap_or(path)
}
