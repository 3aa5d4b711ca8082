//! Directory fingerprint: walk a tree, compute an `XXH64` over
//! every regular file's full content, and produce an entry set.

use crate::xxh64;
use dirsync_protocol::{DirEntry, EntryType};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("root path does not exist or is not a directory: {0}")]
    InvalidRoot(String),
}

/// Walks `root` and returns a `DirEntry` for every reachable regular file and
/// directory, excluding symlinks, sockets, devices, and anything else that is
/// neither a regular file nor a directory. A per-entry I/O error is logged
/// and the entry is skipped; the walk never aborts because of one.
pub fn walk_tree(root: &Path) -> Result<Vec<DirEntry>, FingerprintError> {
    if !root.is_dir() {
        return Err(FingerprintError::InvalidRoot(root.display().to_string()));
    }

    let mut entries = Vec::new();
    let walker = walkdir::WalkDir::new(root).into_iter().filter_map(|res| {
        res.inspect_err(|err| {
            tracing::warn!(error = %err, "error while walking directory tree");
        })
        .ok()
    });

    for dir_entry in walker {
        let path = dir_entry.path();
        if path == root {
            continue;
        }
        match build_entry(path, root) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable entry");
            }
        }
    }

    Ok(entries)
}

/// Builds a single `DirEntry` for `path`, relative to `root`. Returns `Ok(None)`
/// for anything that isn't a regular file or directory (symlinks, sockets,
/// devices, …), which the walk silently excludes.
fn build_entry(path: &Path, root: &Path) -> io::Result<Option<DirEntry>> {
    let metadata = fs::symlink_metadata(path)?;
    let file_type = metadata.file_type();

    let entry_type = if file_type.is_dir() {
        EntryType::Dir
    } else if file_type.is_file() {
        EntryType::File
    } else {
        return Ok(None);
    };

    let relative = relative_slash_path(path, root);
    let hash = if entry_type == EntryType::File {
        hash_file(path)?
    } else {
        0
    };

    Ok(Some(DirEntry::new(relative, entry_type, hash)))
}

/// Computes an `XXH64` (seed 0) fingerprint over a regular file's full
/// content.
pub fn hash_file(path: &Path) -> io::Result<u64> {
    let content = fs::read(path)?;
    Ok(xxh64(&content))
}

/// Normalizes a path relative to `root` into the entry set's lexical form: always
/// `/`-separated, never a leading or trailing slash, regardless of platform.
fn relative_slash_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn empty_file_hashes_to_the_known_xxh64_constant() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        File::create(&path).unwrap();
        assert_eq!(hash_file(&path).unwrap(), 0xef46_db37_51d8_e999);
    }

    #[test]
    fn walk_tree_finds_files_and_dirs() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let mut f = File::create(dir.path().join("sub/a.txt")).unwrap();
        f.write_all(b"hello").unwrap();

        let entries = walk_tree(dir.path()).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"sub"));
        assert!(paths.contains(&"sub/a.txt"));

        let file_entry = entries.iter().find(|e| e.path == "sub/a.txt").unwrap();
        assert!(file_entry.is_file());
        assert_eq!(file_entry.hash, xxh64(b"hello"));

        let dir_entry = entries.iter().find(|e| e.path == "sub").unwrap();
        assert!(dir_entry.is_dir());
        assert_eq!(dir_entry.hash, 0);
    }

    #[test]
    fn relative_paths_always_use_forward_slash() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        File::create(dir.path().join("a/b/c.txt")).unwrap();

        let entries = walk_tree(dir.path()).unwrap();
        let entry = entries.iter().find(|e| e.path.ends_with("c.txt")).unwrap();
        assert_eq!(entry.path, "a/b/c.txt");
        assert!(!entry.path.contains('\\'));
    }
}
