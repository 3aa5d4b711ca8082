//! Reconciliation engine: diffs a local and a remote entry set
//! into the three work sets the rest of the pipeline consumes.

use dirsync_protocol::{DirEntry, EntryType};
use std::collections::BTreeMap;

/// The outcome of comparing a local entry set `L` against a remote entry set
/// `R`. All three sets are path-disjoint from each other by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// `L \ R`: present locally, absent (or different) remotely. Must be
    /// propagated to the server (directory creation or full upload).
    pub to_upload: Vec<DirEntry>,
    /// `R \ L`: present remotely, absent locally. Must be created or
    /// downloaded.
    pub to_download: Vec<DirEntry>,
    /// Same path and type on both sides, but the content hash differs.
    /// Candidates for delta-patch sync rather than a full transfer.
    pub to_delta_sync: Vec<DirEntry>,
}

/// Computes a `ReconcilePlan` from the local (`local`) and remote (`remote`)
/// entry sets. Entry order in the inputs is irrelevant; the plan's vectors
/// are produced in path order.
#[must_use]
pub fn plan(local: &[DirEntry], remote: &[DirEntry]) -> ReconcilePlan {
    let remote_by_path: BTreeMap<&str, &DirEntry> =
        remote.iter().map(|e| (e.path.as_str(), e)).collect();
    let local_by_path: BTreeMap<&str, &DirEntry> =
        local.iter().map(|e| (e.path.as_str(), e)).collect();

    let mut to_upload = Vec::new();
    let mut to_delta_sync = Vec::new();
    for entry in local {
        match remote_by_path.get(entry.path.as_str()) {
            Some(remote_entry) if *remote_entry == entry => {}
            Some(remote_entry)
                if remote_entry.entry_type == entry.entry_type
                    && entry.entry_type == EntryType::File
                    && remote_entry.hash != entry.hash =>
            {
                to_delta_sync.push(entry.clone());
            }
            _ => to_upload.push(entry.clone()),
        }
    }

    let mut to_download = Vec::new();
    for entry in remote {
        match local_by_path.get(entry.path.as_str()) {
            Some(local_entry) if *local_entry == entry => {}
            // A path known on both sides under a different type/hash is
            // already accounted for by the to_upload/to_delta_sync pass.
            Some(_) => {}
            None => to_download.push(entry.clone()),
        }
    }

    to_upload.sort();
    to_download.sort();
    to_delta_sync.sort();

    ReconcilePlan {
        to_upload,
        to_download,
        to_delta_sync,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, hash: u64) -> DirEntry {
        DirEntry::new(path.to_string(), EntryType::File, hash)
    }

    fn dir(path: &str) -> DirEntry {
        DirEntry::new(path.to_string(), EntryType::Dir, 0)
    }

    #[test]
    fn identical_sets_produce_empty_plan() {
        let local = vec![file("a.txt", 1), dir("sub")];
        let remote = local.clone();
        let result = plan(&local, &remote);
        assert!(result.to_upload.is_empty());
        assert!(result.to_download.is_empty());
        assert!(result.to_delta_sync.is_empty());
    }

    #[test]
    fn local_only_file_is_uploaded() {
        let local = vec![file("new.txt", 42)];
        let result = plan(&local, &[]);
        assert_eq!(result.to_upload, vec![file("new.txt", 42)]);
        assert!(result.to_download.is_empty());
        assert!(result.to_delta_sync.is_empty());
    }

    #[test]
    fn remote_only_file_is_downloaded() {
        let remote = vec![file("missing.txt", 42)];
        let result = plan(&[], &remote);
        assert!(result.to_upload.is_empty());
        assert_eq!(result.to_download, vec![file("missing.txt", 42)]);
    }

    #[test]
    fn matching_path_and_type_with_different_hash_is_delta_candidate() {
        let local = vec![file("doc.txt", 1)];
        let remote = vec![file("doc.txt", 2)];
        let result = plan(&local, &remote);
        assert!(result.to_upload.is_empty());
        assert!(result.to_download.is_empty());
        assert_eq!(result.to_delta_sync, vec![file("doc.txt", 1)]);
    }

    #[test]
    fn dir_with_matching_path_but_mismatched_hash_is_not_a_delta_candidate() {
        // Directories always hash to 0, so a hash mismatch on a dir can only
        // mean a type flip, which belongs to full re-upload/download, not delta.
        let local = vec![dir("x")];
        let remote = vec![file("x", 7)];
        let result = plan(&local, &remote);
        assert_eq!(result.to_upload, vec![dir("x")]);
        assert!(result.to_delta_sync.is_empty());
    }

    #[test]
    fn each_path_touched_at_most_once() {
        let local = vec![file("doc.txt", 1), file("only-local.txt", 9)];
        let remote = vec![file("doc.txt", 2), file("only-remote.txt", 9)];
        let result = plan(&local, &remote);
        assert_eq!(result.to_upload, vec![file("only-local.txt", 9)]);
        assert_eq!(result.to_download, vec![file("only-remote.txt", 9)]);
        assert_eq!(result.to_delta_sync, vec![file("doc.txt", 1)]);
    }
}
