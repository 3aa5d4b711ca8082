//! `DirEntry`: one filesystem object under a client's namespace.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
}

impl EntryType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::File => "file",
            EntryType::Dir => "dir",
        }
    }
}

/// One entry in an [entry set](crate): a path, its kind, and its content
/// fingerprint. `path` is always `/`-separated, relative, and never has a
/// leading or trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub hash: u64,
}

impl DirEntry {
    #[must_use]
    pub fn new(path: impl Into<String>, entry_type: EntryType, hash: u64) -> Self {
        Self {
            path: path.into(),
            entry_type,
            hash,
        }
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Dir
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::File
    }
}

// Ordering is strictly by path; equality still requires every field to
// match, so this is PartialOrd/Ord only — PartialEq/Eq keep their derived,
// full-field behavior.
impl PartialOrd for DirEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DirEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}
