//! Rollback: rebuild the working tree as of an earlier commit, then drop
//! every later commit from history.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;

use mama_crypto::ContentHasher;
use mama_index::{StagingArea, TrackedFileIndex};
use mama_store::{CommitLog, CommitStore, RepoLayout, RollbackJournal};
use mama_types::{CommitId, Digest, RollbackMarker};
use tracing::{debug, info, warn};

use crate::config::Clock;
use crate::error::{SdkError, SdkResult};

/// Everything a rollback did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollbackReport {
    pub target: CommitId,
    /// Files removed because a later commit introduced them.
    pub deleted: Vec<String>,
    /// Files rewritten from the target's history.
    pub restored: Vec<String>,
    /// Tracked files whose content does not match the tracked digest afterwards.
    pub mismatches: Vec<String>,
    /// Commits removed from history, oldest first.
    pub pruned: Vec<CommitId>,
    /// Staged paths that were dropped along with their tracked entry.
    pub unstaged: Vec<String>,
    /// Per-file problems that did not stop the rollback.
    pub failures: Vec<RollbackFailure>,
}

impl RollbackReport {
    fn new(target: CommitId) -> Self {
        Self {
            target,
            deleted: Vec::new(),
            restored: Vec::new(),
            mismatches: Vec::new(),
            pruned: Vec::new(),
            unstaged: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// `true` if every file was handled and verified.
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty() && self.failures.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollbackFailure {
    pub path: String,
    pub reason: String,
}

/// Drives a rollback over the repository's storage components.
pub struct RollbackEngine<'a> {
    pub(crate) layout: &'a RepoLayout,
    pub(crate) store: &'a CommitStore,
    pub(crate) log: &'a CommitLog,
    pub(crate) staging: &'a StagingArea,
    pub(crate) journal: &'a RollbackJournal,
    pub(crate) hasher: &'a ContentHasher,
    pub(crate) clock: &'a dyn Clock,
}

impl RollbackEngine<'_> {
    /// Roll the working tree and history back to `target`.
    ///
    /// Steps, in order:
    /// 1. delete working files stored by any later snapshot;
    /// 2. replay the log up to `target`, last writer wins per path;
    /// 3. forget staged paths that were not restored and clear staging;
    /// 4. verify tracked files against their digests;
    /// 5. delete later snapshots and truncate the log;
    /// 6. record the rollback marker.
    pub fn rollback_to(&self, target: &CommitId) -> SdkResult<RollbackReport> {
        if !self.store.exists(target) {
            return Err(SdkError::CommitNotFound(target.clone()));
        }

        let mut report = RollbackReport::new(target.clone());
        let later: Vec<CommitId> = self
            .store
            .list_commit_ids()?
            .into_iter()
            .filter(|id| id > target)
            .collect();
        let staged = self.staging.list()?;
        let mut tracked = TrackedFileIndex::load(self.layout.track_file())?;
        debug!(target = %target, later = later.len(), "starting rollback");

        self.delete_later_files(&later, &mut tracked, &mut report)?;
        self.restore_history(target, &mut tracked, &mut report)?;

        let restored: BTreeSet<&str> = report.restored.iter().map(String::as_str).collect();
        let unstaged: Vec<String> = staged
            .into_iter()
            .filter(|path| !restored.contains(path.as_str()))
            .collect();
        tracked.remove_paths(unstaged.iter().map(String::as_str));
        report.unstaged = unstaged;
        tracked.save()?;
        self.staging.clear()?;

        self.verify(&tracked, &mut report);

        for id in &later {
            self.store.delete_snapshot(id)?;
        }
        report.pruned = self.log.truncate_after(target)?;
        for id in &later {
            if !report.pruned.contains(id) {
                report.pruned.push(id.clone());
            }
        }
        report.pruned.sort();

        self.journal
            .write(&RollbackMarker::new(target.clone(), &self.clock.now()))?;

        info!(
            target = %target,
            deleted = report.deleted.len(),
            restored = report.restored.len(),
            pruned = report.pruned.len(),
            "rollback complete"
        );
        Ok(report)
    }

    // ---- Steps ----

    fn delete_later_files(
        &self,
        later: &[CommitId],
        tracked: &mut TrackedFileIndex,
        report: &mut RollbackReport,
    ) -> SdkResult<()> {
        let mut doomed = BTreeSet::new();
        for id in later {
            doomed.extend(self.store.stored_paths(id)?);
        }

        for path in &doomed {
            let file = self.layout.workdir().join(path);
            match fs::remove_file(&file) {
                Ok(()) => report.deleted.push(path.clone()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path, error = %e, "failed to delete file");
                    report.failures.push(RollbackFailure {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        tracked.remove_paths(doomed.iter().map(String::as_str));
        Ok(())
    }

    fn restore_history(
        &self,
        target: &CommitId,
        tracked: &mut TrackedFileIndex,
        report: &mut RollbackReport,
    ) -> SdkResult<()> {
        let mut latest: BTreeMap<String, (CommitId, Digest)> = BTreeMap::new();
        for commit in self.log.load()?.into_iter().filter(|c| &c.commit_id <= target) {
            for record in commit.files {
                latest.insert(record.file_name, (commit.commit_id.clone(), record.hash));
            }
        }

        for (path, (id, digest)) in latest {
            let dest = self.layout.workdir().join(&path);
            match self.store.restore_blob(&id, &path, &dest) {
                Ok(()) => {
                    tracked.set(path.clone(), digest);
                    report.restored.push(path);
                }
                Err(e) => {
                    warn!(path = %path, commit = %id, error = %e, "failed to restore file");
                    report.failures.push(RollbackFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn verify(&self, tracked: &TrackedFileIndex, report: &mut RollbackReport) {
        for (path, expected) in tracked.entries() {
            let file = self.layout.workdir().join(path);
            if !file.is_file() {
                continue;
            }
            match self.hasher.verify_file(&file, expected) {
                Ok(true) => {}
                Ok(false) => {
                    warn!(path = %path, "content does not match tracked digest");
                    report.mismatches.push(path.clone());
                }
                Err(e) => report.failures.push(RollbackFailure {
                    path: path.clone(),
                    reason: e.to_string(),
                }),
            }
        }
    }
}

/// Second-newest snapshot id, the target of a relative rollback.
pub(crate) fn previous_commit(ids: &[CommitId]) -> SdkResult<CommitId> {
    match ids {
        [.., previous, _latest] => Ok(previous.clone()),
        _ => Err(SdkError::NoPreviousCommit),
    }
}
