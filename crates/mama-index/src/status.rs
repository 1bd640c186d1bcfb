//! Working tree status: how each eligible or tracked path relates to the
//! staging list, the tracked digests, and committed history.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use mama_crypto::ContentHasher;
use tracing::warn;

use crate::tracked::TrackedFileIndex;

/// Result of [`compute_status`]. Every list is in path order except
/// `staged`, which keeps staging order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkdirStatus {
    pub staged: Vec<StatusEntry>,
    /// Tracked, not staged, content differs from the tracked digest.
    pub modified: Vec<String>,
    /// Tracked but no longer a regular file on disk.
    pub deleted: Vec<String>,
    /// Eligible files with no tracked digest.
    pub untracked: Vec<String>,
}

impl WorkdirStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
            && self.untracked.is_empty()
    }
}

/// One staged path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub status: FileStatus,
}

impl StatusEntry {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// Whether a staged path has been committed before.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileStatus {
    New,
    Modified,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => f.write_str("new file"),
            Self::Modified => f.write_str("modified"),
        }
    }
}

/// Classify the working tree.
///
/// `walked` holds the eligible files found on disk, `committed` every path
/// that appears in some commit. Staged paths are not re-hashed. A tracked
/// file that cannot be read is logged and left out of `modified`.
pub fn compute_status(
    workdir: &Path,
    walked: Vec<String>,
    staged: &[String],
    committed: &BTreeSet<String>,
    tracked: &TrackedFileIndex,
    hasher: &ContentHasher,
) -> WorkdirStatus {
    let mut status = WorkdirStatus::new();
    status.staged = staged
        .iter()
        .map(|path| {
            let kind = if committed.contains(path) {
                FileStatus::Modified
            } else {
                FileStatus::New
            };
            StatusEntry::new(path.clone(), kind)
        })
        .collect();

    let staged: BTreeSet<&str> = staged.iter().map(String::as_str).collect();
    for path in walked {
        let Some(expected) = tracked.get(&path) else {
            status.untracked.push(path);
            continue;
        };
        if staged.contains(path.as_str()) {
            continue;
        }
        match hasher.verify_file(&workdir.join(&path), expected) {
            Ok(true) => {}
            Ok(false) => status.modified.push(path),
            Err(e) => warn!(path = %path, error = %e, "cannot hash tracked file"),
        }
    }

    status.deleted = tracked
        .entries()
        .keys()
        .filter(|path| !workdir.join(path.as_str()).is_file())
        .cloned()
        .collect();
    status.modified.sort();
    status.untracked.sort();
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::StagingArea;
    use std::fs;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_status_is_clean() {
        let status = WorkdirStatus::new();
        assert!(status.is_clean());
        assert!(status.staged.is_empty());
    }

    #[test]
    fn untracked_only_is_not_clean() {
        let mut status = WorkdirStatus::new();
        status.untracked.push("new.txt".to_string());
        assert!(!status.is_clean());
        assert!(status.staged.is_empty());
    }

    #[test]
    fn classifies_every_kind() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let hasher = ContentHasher::default();
        let staging = StagingArea::new(root.join("index.txt"));
        let mut tracked = TrackedFileIndex::load(root.join("track.json")).unwrap();

        for (name, body) in [("same.txt", "s"), ("edited.txt", "v1"), ("gone.txt", "g"), ("old.txt", "o")] {
            fs::write(root.join(name), body).unwrap();
            tracked.set(name, ContentHasher::hash_bytes(body.as_bytes()));
        }
        fs::write(root.join("edited.txt"), "v2").unwrap();
        fs::remove_file(root.join("gone.txt")).unwrap();
        fs::write(root.join("old.txt"), "o2").unwrap();
        tracked.stage_if_changed("old.txt", &root.join("old.txt"), &hasher, &staging).unwrap();
        fs::write(root.join("fresh.txt"), "f").unwrap();

        let committed: BTreeSet<String> = paths(&["old.txt"]).into_iter().collect();
        let walked = paths(&["edited.txt", "fresh.txt", "old.txt", "same.txt"]);
        let status = compute_status(root, walked, &staging.list().unwrap(), &committed, &tracked, &hasher);

        assert_eq!(status.staged, vec![StatusEntry::new("old.txt", FileStatus::Modified)]);
        assert_eq!(status.modified, paths(&["edited.txt"]));
        assert_eq!(status.deleted, paths(&["gone.txt"]));
        assert_eq!(status.untracked, paths(&["fresh.txt"]));
        assert_eq!(FileStatus::Modified.to_string(), "modified");
    }
}
