use std::collections::BTreeMap;
use std::fmt::Write as _;

use mama_diff::{diff_file_sets, BlobDiff};
use mama_types::{CommitId, Digest};

/// What to compare in [`Repository::diff`](crate::Repository::diff).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffTarget {
    /// The second-newest commit against the newest.
    LatestWithPrevious,
    /// A commit against the tracked files in the working tree.
    WorkingTree(CommitId),
    /// Two commits, old then new.
    Commits(CommitId, CommitId),
}

/// One side of a comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Side {
    Commit(CommitId),
    WorkingTree,
}

impl Side {
    /// Label prefix for paths on this side: the commit id, or `working`.
    pub fn label(&self, path: &str) -> String {
        match self {
            Self::Commit(id) => format!("{id}/{path}"),
            Self::WorkingTree => format!("working/{path}"),
        }
    }
}

/// A single path-level change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileChange {
    Added { path: String },
    Deleted { path: String },
    Modified { path: String, diff: BlobDiff },
}

impl FileChange {
    pub fn path(&self) -> &str {
        match self {
            Self::Added { path } | Self::Deleted { path } | Self::Modified { path, .. } => path,
        }
    }
}

/// The result of comparing two file sets, for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub old: Side,
    pub new: Side,
    /// Changes in path order: additions, then deletions, then modifications.
    pub changes: Vec<FileChange>,
}

impl Comparison {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn added(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().filter_map(|c| match c {
            FileChange::Added { path } => Some(path.as_str()),
            _ => None,
        })
    }

    pub fn deleted(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().filter_map(|c| match c {
            FileChange::Deleted { path } => Some(path.as_str()),
            _ => None,
        })
    }

    pub fn modified(&self) -> impl Iterator<Item = (&str, &BlobDiff)> {
        self.changes.iter().filter_map(|c| match c {
            FileChange::Modified { path, diff } => Some((path.as_str(), diff)),
            _ => None,
        })
    }

    /// Plain-text rendering: one line per added or deleted file, then a
    /// unified diff per modified file labelled `<side>/<path>`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for path in self.added() {
            let _ = writeln!(out, "added: {path}");
        }
        for path in self.deleted() {
            let _ = writeln!(out, "deleted: {path}");
        }
        for (path, diff) in self.modified() {
            out.push_str(&diff.to_unified(&self.old.label(path), &self.new.label(path)));
        }
        out
    }
}

/// Build a [`Comparison`] from two digest maps.
///
/// `load_diff` is called for each modified path. Paths only on the old side
/// are reported as deleted only if `is_gone` says they are missing from the
/// working tree.
pub(crate) fn build_comparison<E>(
    old: Side,
    new: Side,
    old_set: &BTreeMap<String, Digest>,
    new_set: &BTreeMap<String, Digest>,
    is_gone: impl Fn(&str) -> bool,
    mut load_diff: impl FnMut(&str) -> Result<BlobDiff, E>,
) -> Result<Comparison, E> {
    let sets = diff_file_sets(old_set, new_set);
    let mut changes = Vec::new();
    changes.extend(sets.added.into_iter().map(|path| FileChange::Added { path }));
    changes.extend(
        sets.removed
            .into_iter()
            .filter(|path| is_gone(path))
            .map(|path| FileChange::Deleted { path }),
    );
    for path in sets.modified {
        let diff = load_diff(&path)?;
        changes.push(FileChange::Modified { path, diff });
    }
    Ok(Comparison { old, new, changes })
}
