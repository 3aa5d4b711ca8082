//! Path safety: validates a client-supplied, namespace-relative path
//! before it's joined onto `<root>/<K>/…`, so a malicious `path=` value
//! can never escape a client's namespace directory.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathSafetyError {
    #[error("path is empty")]
    Empty,
    #[error("path is absolute")]
    Absolute,
    #[error("path contains a parent directory reference")]
    ParentTraversal,
    #[error("path contains a null byte")]
    NullByte,
}

/// Validates `path` (as received in a `path=` query parameter) and returns
/// its safe, native-path form, ready to be joined onto a client's namespace
/// root. Rejects anything that would escape that root: absolute paths and any
/// `..` component, normalizing on the `/`-separated components directly
/// (never via filesystem canonicalization, since the target may not exist
/// yet).
pub fn validate_relative_path(path: &str) -> Result<PathBuf, PathSafetyError> {
    if path.is_empty() {
        return Err(PathSafetyError::Empty);
    }
    if path.contains('\0') {
        return Err(PathSafetyError::NullByte);
    }
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(PathSafetyError::Absolute);
    }

    let mut components = Vec::new();
    for component in path.split(['/', '\\']) {
        match component {
            "" | "." => {}
            ".." => return Err(PathSafetyError::ParentTraversal),
            other => components.push(other),
        }
    }

    if components.is_empty() {
        return Err(PathSafetyError::Empty);
    }

    Ok(components.into_iter().collect())
}

/// Joins a validated relative path onto a client's namespace root. Callers
/// must pass the output of [`validate_relative_path`]; this function does not
/// re-validate.
#[must_use]
pub fn resolve_in_namespace(namespace_root: &Path, relative: &Path) -> PathBuf {
    namespace_root.join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_relative_path() {
        assert_eq!(
            validate_relative_path("docs/report.txt").unwrap(),
            PathBuf::from("docs/report.txt")
        );
    }

    #[test]
    fn rejects_parent_traversal() {
        assert_eq!(
            validate_relative_path("../../etc/passwd"),
            Err(PathSafetyError::ParentTraversal)
        );
    }

    #[test]
    fn rejects_embedded_parent_traversal() {
        assert_eq!(
            validate_relative_path("a/../../b"),
            Err(PathSafetyError::ParentTraversal)
        );
    }

    #[test]
    fn rejects_absolute_path() {
        assert_eq!(
            validate_relative_path("/etc/passwd"),
            Err(PathSafetyError::Absolute)
        );
    }

    #[test]
    fn rejects_empty_path() {
        assert_eq!(validate_relative_path(""), Err(PathSafetyError::Empty));
    }

    #[test]
    fn rejects_null_byte() {
        assert_eq!(
            validate_relative_path("a\0b"),
            Err(PathSafetyError::NullByte)
        );
    }

    #[test]
    fn collapses_redundant_current_dir_components() {
        assert_eq!(
            validate_relative_path("./a/./b").unwrap(),
            PathBuf::from("a/b")
        );
    }

    #[test]
    fn resolved_path_stays_under_namespace_root() {
        let root = Path::new("/srv/dirsync/client-42");
        let relative = validate_relative_path("docs/report.txt").unwrap();
        let resolved = resolve_in_namespace(root, &relative);
        assert!(resolved.starts_with(root));
    }
}
