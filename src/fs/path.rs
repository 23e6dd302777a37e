// src/fs/path.rs

//! Path normalisation and the case-insensitive identity used for queue
//! entries, diagnostics and dependency map keys.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Lexically normalise a path: drop `.` segments and resolve `..` against
/// the preceding segment. The filesystem is never consulted.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        let s = rel.to_string_lossy().replace('\\', "/");
        return Some(s);
    }

    // macOS reports the same directory under different absolute prefixes
    // (/private/var vs /var).
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            let s = rel.to_string_lossy().replace('\\', "/");
            return Some(s);
        }
    }

    None
}

/// Case-insensitive identity of a file path.
///
/// Two paths that differ only in letter case, separator style or redundant
/// `.`/`..` segments map to the same key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey(String);

impl PathKey {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let normalized = normalize(path.as_ref());
        let s = normalized.to_string_lossy().replace('\\', "/");
        PathKey(s.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive `ends_with` on the normalised path.
    pub fn ends_with(&self, suffix: &str) -> bool {
        self.0.ends_with(&suffix.to_lowercase())
    }
}

impl From<&Path> for PathKey {
    fn from(path: &Path) -> Self {
        PathKey::new(path)
    }
}

impl From<&PathBuf> for PathKey {
    fn from(path: &PathBuf) -> Self {
        PathKey::new(path)
    }
}

impl fmt::Debug for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathKey({:?})", self.0)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_dot_segments() {
        assert_eq!(
            normalize(Path::new("/proj/css/../js/./app.js")),
            PathBuf::from("/proj/js/app.js")
        );
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a/b/..")), PathBuf::from("../a"));
    }

    #[test]
    fn relative_str_uses_forward_slashes() {
        assert_eq!(
            relative_str(Path::new("/proj"), Path::new("/proj/css/site.css")).as_deref(),
            Some("css/site.css")
        );
    }

    #[test]
    fn keys_ignore_case_and_redundant_segments() {
        let a = PathKey::new("/Proj/Site.CSS");
        let b = PathKey::new("/proj/./x/../site.css");
        assert_eq!(a, b);
        assert!(a.ends_with(".Css"));
    }
}
