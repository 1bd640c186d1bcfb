//! File-set comparison between two path to digest maps.

use std::collections::BTreeMap;

use mama_types::Digest;

/// Path-level differences between an old and a new file set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Paths only in the new set.
    pub added: Vec<String>,
    /// Paths only in the old set.
    pub removed: Vec<String>,
    /// Paths in both sets with different digests.
    pub modified: Vec<String>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Compare two digest maps. Every list comes out in path order.
pub fn diff_file_sets(old: &BTreeMap<String, Digest>, new: &BTreeMap<String, Digest>) -> SnapshotDiff {
    let mut diff = SnapshotDiff::default();
    for (path, old_digest) in old {
        match new.get(path) {
            None => diff.removed.push(path.clone()),
            Some(new_digest) if new_digest != old_digest => diff.modified.push(path.clone()),
            Some(_) => {}
        }
    }
    diff.added = new
        .keys()
        .filter(|path| !old.contains_key(*path))
        .cloned()
        .collect();
    diff
}
