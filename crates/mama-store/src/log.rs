use std::path::{Path, PathBuf};

use mama_types::{Commit, CommitId};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::persist::{read_json, read_json_or_default, write_json_atomic};

/// The commit history in `log.json`, oldest first.
///
/// Every mutation is a full read-modify-rewrite of the file.
#[derive(Clone, Debug)]
pub struct CommitLog {
    path: PathBuf,
}

impl CommitLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All commits. A missing, blank, or corrupted log reads as empty.
    pub fn load(&self) -> StoreResult<Vec<Commit>> {
        read_json_or_default(&self.path)
    }

    /// All commits, failing with [`StoreError::CorruptedMetadata`] on a bad log.
    pub fn load_checked(&self) -> StoreResult<Vec<Commit>> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    pub fn save(&self, commits: &[Commit]) -> StoreResult<()> {
        write_json_atomic(&self.path, commits)
    }

    /// Append one commit. Its id must be new to the log.
    pub fn append(&self, commit: Commit) -> StoreResult<()> {
        let mut commits = self.load()?;
        if commits.iter().any(|c| c.commit_id == commit.commit_id) {
            return Err(StoreError::DuplicateCommit(commit.commit_id));
        }
        debug!(commit = %commit.commit_id, files = commit.files.len(), "appending to log");
        commits.push(commit);
        self.save(&commits)
    }

    pub fn find(&self, id: &CommitId) -> StoreResult<Commit> {
        self.load()?
            .into_iter()
            .find(|c| &c.commit_id == id)
            .ok_or_else(|| StoreError::CommitNotFound(id.clone()))
    }

    /// The newest commit, if any.
    pub fn last(&self) -> StoreResult<Option<Commit>> {
        Ok(self.load()?.pop())
    }

    /// Keep only commits whose id sorts at or before `id`.
    ///
    /// Returns the ids that were dropped.
    pub fn truncate_after(&self, id: &CommitId) -> StoreResult<Vec<CommitId>> {
        let (kept, dropped): (Vec<Commit>, Vec<Commit>) =
            self.load()?.into_iter().partition(|c| &c.commit_id <= id);
        self.save(&kept)?;
        Ok(dropped.into_iter().map(|c| c.commit_id).collect())
    }

    /// Drop a single entry. Returns `false` if it was not present.
    pub fn remove(&self, id: &CommitId) -> StoreResult<bool> {
        let mut commits = self.load()?;
        let before = commits.len();
        commits.retain(|c| &c.commit_id != id);
        if commits.len() == before {
            return Ok(false);
        }
        self.save(&commits)?;
        Ok(true)
    }
}
