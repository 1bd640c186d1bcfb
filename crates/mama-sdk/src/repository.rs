use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use mama_crypto::ContentHasher;
use mama_diff::{diff_blobs_with_context, BlobDiff};
use mama_index::{
    compute_status, normalize, relative_key, walk_dir, walk_workdir, ExclusionSet, IndexError,
    StageOutcome, StagingArea, TrackedFileIndex, WalkReport, WorkdirStatus,
};
use mama_store::{CommitLog, CommitStore, RepoLayout, RollbackJournal};
use mama_types::{Commit, CommitId, Digest, FileRecord, RollbackMarker};
use tracing::{debug, info, warn};

use crate::commit::{AddFailure, AddReport, CommitOutcome, CommitSummary, InitOutcome};
use crate::compare::{build_comparison, Comparison, DiffTarget, Side};
use crate::config::{RepoConfig, RepoSettings};
use crate::error::{SdkError, SdkResult};
use crate::rollback::{previous_commit, RollbackEngine, RollbackReport};

/// A version-controlled working directory.
///
/// Every operation re-reads the metadata it needs from disk, so a
/// `Repository` holds no state beyond its configuration.
pub struct Repository {
    config: RepoConfig,
    layout: RepoLayout,
    store: CommitStore,
    log: CommitLog,
    staging: StagingArea,
    journal: RollbackJournal,
    hasher: ContentHasher,
}

impl Repository {
    /// Create the metadata directory if it does not exist yet.
    pub fn init(config: RepoConfig) -> SdkResult<(Self, InitOutcome)> {
        let repo = Self::from_config(config);
        if !repo.layout.create()? {
            debug!(root = %repo.layout.root().display(), "repository already initialized");
            return Ok((repo, InitOutcome::AlreadyInitialized));
        }
        fs::write(repo.layout.index_file(), "")?;
        repo.log.save(&[])?;
        info!(root = %repo.layout.root().display(), "initialized repository");
        Ok((repo, InitOutcome::Created))
    }

    /// Open an existing repository.
    pub fn open(config: RepoConfig) -> SdkResult<Self> {
        let repo = Self::from_config(config);
        if !repo.layout.is_initialized() {
            return Err(SdkError::NotInitialized(repo.layout.root().to_path_buf()));
        }
        Ok(repo)
    }

    fn from_config(config: RepoConfig) -> Self {
        let layout = RepoLayout::new(
            config.workdir.clone(),
            &config.metadata_dir,
            &config.ignore_file_name(),
        );
        Self {
            store: CommitStore::new(layout.commits_dir()),
            log: CommitLog::new(layout.log_file()),
            staging: StagingArea::new(layout.index_file()),
            journal: RollbackJournal::new(layout.rollback_file()),
            hasher: ContentHasher::with_chunk_size(config.hash_chunk_size),
            layout,
            config,
        }
    }

    // ---- Staging ----

    /// Stage a file, or every eligible file under a directory.
    ///
    /// A missing file is [`SdkError::FileNotFound`]. Within a directory,
    /// per-file failures are collected in the report.
    pub fn add(&self, path: &Path) -> SdkResult<AddReport> {
        let exclusions = self.exclusions()?;
        let workdir = self.layout.workdir();
        let target = workdir.join(path);

        let key = match relative_key(workdir, path) {
            Ok(key) => Some(key),
            Err(IndexError::InvalidPath(_)) if normalize(&target) == exclusions.workdir() => None,
            Err(e) => return Err(e.into()),
        };

        if exclusions.is_excluded(&target) {
            let mut report = AddReport::default();
            report.excluded.push(key.unwrap_or_else(|| path.display().to_string()));
            debug!(path = %path.display(), "excluded, not staged");
            return Ok(report);
        }

        if target.is_dir() {
            return self.stage_walk(walk_dir(workdir, path, &exclusions));
        }

        let Some(key) = key else {
            return Err(SdkError::InvalidPath(path.display().to_string()));
        };
        let mut tracked = self.tracked()?;
        let mut report = AddReport::default();
        match tracked.stage_if_changed(&key, &target, &self.hasher, &self.staging)? {
            StageOutcome::Staged(_) => report.staged.push(key),
            StageOutcome::Unchanged => report.unchanged.push(key),
        }
        Ok(report)
    }

    /// Stage several paths as one batch.
    ///
    /// Relative paths are taken relative to the working directory. A path
    /// that is missing or outside the working directory is recorded as a
    /// failure and the rest of the batch still runs.
    pub fn add_paths(&self, paths: &[PathBuf]) -> SdkResult<AddReport> {
        let mut report = AddReport::default();
        for path in paths {
            match self.add(path) {
                Ok(part) => report.absorb(part),
                Err(e @ (SdkError::FileNotFound(_) | SdkError::InvalidPath(_))) => {
                    warn!(path = %path.display(), error = %e, "cannot stage path");
                    report.failures.push(AddFailure {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    /// Stage every eligible file in the working directory.
    pub fn add_all(&self) -> SdkResult<AddReport> {
        let exclusions = self.exclusions()?;
        self.stage_walk(walk_workdir(self.layout.workdir(), &exclusions))
    }

    fn stage_walk(&self, walk: WalkReport) -> SdkResult<AddReport> {
        let mut tracked = self.tracked()?;
        let mut report = AddReport::default();
        report.failures.extend(walk.failures.into_iter().map(|f| AddFailure {
            path: f.path.display().to_string(),
            reason: f.reason,
        }));

        for key in walk.files {
            let file = self.layout.workdir().join(&key);
            match tracked.stage_if_changed(&key, &file, &self.hasher, &self.staging) {
                Ok(StageOutcome::Staged(_)) => report.staged.push(key),
                Ok(StageOutcome::Unchanged) => report.unchanged.push(key),
                Err(e) => {
                    warn!(path = %key, error = %e, "failed to stage file");
                    report.failures.push(AddFailure {
                        path: key,
                        reason: e.to_string(),
                    });
                }
            }
        }
        debug!(
            staged = report.staged.len(),
            unchanged = report.unchanged.len(),
            failed = report.failures.len(),
            "add complete"
        );
        Ok(report)
    }

    // ---- Commit ----

    /// Turn the staged files into a new commit.
    ///
    /// Every staged file is re-hashed first; if any changed or vanished since
    /// it was staged the commit aborts with [`SdkError::RaceDetected`] and
    /// nothing is written.
    pub fn commit(&self, message: &str) -> SdkResult<CommitOutcome> {
        let staged = self.staging.list()?;
        if staged.is_empty() {
            debug!("nothing staged");
            return Ok(CommitOutcome::NothingToCommit);
        }

        let tracked = self.tracked()?;
        let records = self.check_staged(&staged, &tracked)?;
        let history = self.log.load()?;

        let now = self.config.clock.now();
        let newest = self.newest_commit_id(&history)?;
        let id = CommitId::next_after(&now, newest.as_ref())?;

        self.store.create_snapshot(&id, self.layout.workdir(), &staged)?;
        let commit = Commit::new(id.clone(), message, records, &now);
        self.record_commit(&self.log, &commit, tracked)?;
        self.staging.clear()?;

        let committed: BTreeSet<&str> = history.iter().flat_map(|c| c.paths()).collect();
        let (modified_files, new_files): (Vec<String>, Vec<String>) = staged
            .into_iter()
            .partition(|path| committed.contains(path.as_str()));

        info!(commit = %id, files = commit.files.len(), "committed");
        Ok(CommitOutcome::Committed(CommitSummary {
            commit,
            new_files,
            modified_files,
        }))
    }

    /// Append `commit` to `log` and merge its files into `tracked`.
    ///
    /// On failure the snapshot is discarded, and the log entry too if it
    /// was already written.
    fn record_commit(
        &self,
        log: &CommitLog,
        commit: &Commit,
        mut tracked: TrackedFileIndex,
    ) -> SdkResult<()> {
        let id = &commit.commit_id;
        if let Err(e) = log.append(commit.clone()) {
            self.discard_snapshot(id);
            return Err(e.into());
        }

        tracked.merge(&commit.files);
        if let Err(e) = tracked.save() {
            if let Err(undo) = log.remove(id) {
                warn!(commit = %id, error = %undo, "failed to remove log entry");
            }
            self.discard_snapshot(id);
            return Err(e.into());
        }
        Ok(())
    }

    fn check_staged(&self, staged: &[String], tracked: &TrackedFileIndex) -> SdkResult<Vec<FileRecord>> {
        let mut records = Vec::with_capacity(staged.len());
        let mut raced = Vec::new();
        for path in staged {
            match self.hasher.hash_file(&self.layout.workdir().join(path)) {
                Ok(digest) if tracked.get(path) == Some(&digest) => {
                    records.push(FileRecord::new(path.clone(), digest));
                }
                Ok(_) => raced.push(path.clone()),
                Err(e) if e.is_not_found() => raced.push(path.clone()),
                Err(e) => return Err(e.into()),
            }
        }
        if !raced.is_empty() {
            warn!(paths = ?raced, "staged files changed before commit");
            return Err(SdkError::RaceDetected { paths: raced });
        }
        Ok(records)
    }

    fn newest_commit_id(&self, history: &[Commit]) -> SdkResult<Option<CommitId>> {
        let stored = self.store.list_commit_ids()?;
        Ok(history
            .iter()
            .map(|c| &c.commit_id)
            .chain(stored.iter())
            .max()
            .cloned())
    }

    fn discard_snapshot(&self, id: &CommitId) {
        if let Err(e) = self.store.delete_snapshot(id) {
            warn!(commit = %id, error = %e, "failed to remove snapshot");
        }
    }

    // ---- Queries ----

    /// Staged, modified, deleted, and untracked files.
    pub fn status(&self) -> SdkResult<WorkdirStatus> {
        let exclusions = self.exclusions()?;
        let workdir = self.layout.workdir();
        let walk = walk_workdir(workdir, &exclusions);
        Ok(compute_status(
            workdir,
            walk.files,
            &self.staging.list()?,
            &self.committed_paths()?,
            &self.tracked()?,
            &self.hasher,
        ))
    }

    /// All commits, oldest first.
    pub fn log(&self) -> SdkResult<Vec<Commit>> {
        Ok(self.log.load()?)
    }

    pub fn commit_details(&self, id: &CommitId) -> SdkResult<Commit> {
        Ok(self.log.find(id)?)
    }

    /// The marker written by the most recent rollback.
    pub fn last_rollback(&self) -> SdkResult<Option<RollbackMarker>> {
        Ok(self.journal.read()?)
    }

    // ---- Diff ----

    pub fn diff(&self, target: &DiffTarget) -> SdkResult<Comparison> {
        match target {
            DiffTarget::LatestWithPrevious => self.compare_latest_with_previous(),
            DiffTarget::WorkingTree(id) => self.compare_with_commit(id),
            DiffTarget::Commits(old, new) => self.compare(old, new),
        }
    }

    /// Compare two snapshots, `old` then `new`.
    pub fn compare(&self, old: &CommitId, new: &CommitId) -> SdkResult<Comparison> {
        let old_set = self.snapshot_digests(old)?;
        let new_set = self.snapshot_digests(new)?;
        let context = self.diff_context();
        build_comparison(
            Side::Commit(old.clone()),
            Side::Commit(new.clone()),
            &old_set,
            &new_set,
            |path| !self.layout.workdir().join(path).exists(),
            |path| -> SdkResult<BlobDiff> {
                let before = self.store.read_blob(old, path)?;
                let after = self.store.read_blob(new, path)?;
                Ok(diff_blobs_with_context(&before, &after, context))
            },
        )
    }

    /// Compare a snapshot with the tracked files present in the working tree.
    pub fn compare_with_commit(&self, id: &CommitId) -> SdkResult<Comparison> {
        let old_set = self.snapshot_digests(id)?;
        let workdir = self.layout.workdir();
        let mut new_set = BTreeMap::new();
        for path in self.tracked()?.entries().keys() {
            let file = workdir.join(path);
            if file.is_file() {
                new_set.insert(path.clone(), self.hasher.hash_file(&file)?);
            }
        }

        let context = self.diff_context();
        build_comparison(
            Side::Commit(id.clone()),
            Side::WorkingTree,
            &old_set,
            &new_set,
            |path| !workdir.join(path).exists(),
            |path| -> SdkResult<BlobDiff> {
                let before = self.store.read_blob(id, path)?;
                let after = fs::read(workdir.join(path))?;
                Ok(diff_blobs_with_context(&before, &after, context))
            },
        )
    }

    /// Compare the second-newest commit with the newest.
    pub fn compare_latest_with_previous(&self) -> SdkResult<Comparison> {
        let ids = self.store.list_commit_ids()?;
        let previous = previous_commit(&ids)?;
        let latest = ids.last().ok_or(SdkError::NoPreviousCommit)?;
        self.compare(&previous, latest)
    }

    fn snapshot_digests(&self, id: &CommitId) -> SdkResult<BTreeMap<String, Digest>> {
        let dir = self.store.snapshot_dir(id);
        let mut digests = BTreeMap::new();
        for path in self.store.stored_paths(id)? {
            let digest = self.hasher.hash_file(&dir.join(&path))?;
            digests.insert(path, digest);
        }
        Ok(digests)
    }

    // ---- Rollback ----

    /// Roll back to `target`, or to the commit before the newest if `None`.
    pub fn rollback(&self, target: Option<&CommitId>) -> SdkResult<RollbackReport> {
        match target {
            Some(id) => self.rollback_to(id),
            None => self.rollback_to_previous(),
        }
    }

    pub fn rollback_to(&self, target: &CommitId) -> SdkResult<RollbackReport> {
        self.rollback_engine().rollback_to(target)
    }

    pub fn rollback_to_previous(&self) -> SdkResult<RollbackReport> {
        let previous = previous_commit(&self.store.list_commit_ids()?)?;
        self.rollback_to(&previous)
    }

    fn rollback_engine(&self) -> RollbackEngine<'_> {
        RollbackEngine {
            layout: &self.layout,
            store: &self.store,
            log: &self.log,
            staging: &self.staging,
            journal: &self.journal,
            hasher: &self.hasher,
            clock: self.config.clock.as_ref(),
        }
    }

    // ---- Accessors ----

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn layout(&self) -> &RepoLayout {
        &self.layout
    }

    /// Tracked digests as currently persisted.
    pub fn tracked(&self) -> SdkResult<TrackedFileIndex> {
        Ok(TrackedFileIndex::load(self.layout.track_file())?)
    }

    pub fn staged(&self) -> SdkResult<Vec<String>> {
        Ok(self.staging.list()?)
    }

    pub fn commit_ids(&self) -> SdkResult<Vec<CommitId>> {
        Ok(self.store.list_commit_ids()?)
    }

    fn settings(&self) -> RepoSettings {
        RepoSettings::load(&self.layout.settings_file())
    }

    fn exclusions(&self) -> SdkResult<ExclusionSet> {
        let settings = self.settings();
        Ok(ExclusionSet::load(
            self.layout.workdir(),
            &self.config.exclusions(),
            self.layout.ignore_file(),
            &settings.exclude,
        )?)
    }

    fn diff_context(&self) -> usize {
        self.settings()
            .diff
            .context_lines
            .unwrap_or(self.config.diff_context)
    }

    fn committed_paths(&self) -> SdkResult<BTreeSet<String>> {
        Ok(self
            .log
            .load()?
            .iter()
            .flat_map(|c| c.paths())
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SteppingClock;
    use mama_index::{FileStatus, StatusEntry};
    use chrono::{Duration, NaiveDateTime};
    use tempfile::TempDir;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn config(dir: &TempDir) -> RepoConfig {
        RepoConfig::new(dir.path())
            .with_clock(SteppingClock::new(at("2024-10-25 16:33:08"), Duration::seconds(1)))
    }

    fn setup() -> (TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let (repo, outcome) = Repository::init(config(&dir)).unwrap();
        assert_eq!(outcome, InitOutcome::Created);
        (dir, repo)
    }

    fn write(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn read(dir: &TempDir, rel: &str) -> String {
        fs::read_to_string(dir.path().join(rel)).unwrap()
    }

    fn commit_file(repo: &Repository, rel: &str, message: &str) -> CommitId {
        repo.add(Path::new(rel)).unwrap();
        match repo.commit(message).unwrap() {
            CommitOutcome::Committed(summary) => summary.commit.commit_id,
            CommitOutcome::NothingToCommit => panic!("nothing to commit"),
        }
    }

    // ---- Init ----

    #[test]
    fn init_creates_empty_metadata() {
        let (dir, repo) = setup();
        assert!(dir.path().join(".mama/commits").is_dir());
        assert_eq!(read(&dir, ".mama/index.txt"), "");
        assert!(repo.log().unwrap().is_empty());
        assert!(repo.tracked().unwrap().is_empty());
    }

    #[test]
    fn init_twice_keeps_history() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "hello");
        commit_file(&repo, "a.txt", "first");

        let (again, outcome) = Repository::init(config(&dir)).unwrap();
        assert_eq!(outcome, InitOutcome::AlreadyInitialized);
        assert_eq!(again.log().unwrap().len(), 1);
    }

    #[test]
    fn open_requires_init() {
        let dir = tempfile::tempdir().unwrap();
        let err = Repository::open(config(&dir)).err().unwrap();
        assert!(matches!(err, SdkError::NotInitialized(_)));
    }

    // ---- Add and commit ----

    #[test]
    fn first_commit_records_file() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "hello");
        let report = repo.add(Path::new("a.txt")).unwrap();
        assert_eq!(report.staged, vec!["a.txt"]);

        let outcome = repo.commit("first").unwrap();
        let summary = outcome.summary().unwrap();
        let hello = ContentHasher::hash_bytes(b"hello");
        assert_eq!(summary.commit.commit_id.as_str(), "20241025163308000000");
        assert_eq!(summary.commit.message, "first");
        assert_eq!(summary.commit.files, vec![FileRecord::new("a.txt", hello)]);
        assert_eq!(summary.new_files, vec!["a.txt"]);
        assert!(summary.modified_files.is_empty());

        assert!(repo.staged().unwrap().is_empty());
        assert_eq!(repo.tracked().unwrap().get("a.txt"), Some(&hello));
        assert_eq!(read(&dir, ".mama/commits/20241025163308000000/a.txt"), "hello");
    }

    #[test]
    fn staging_is_idempotent() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "hello");
        repo.add(Path::new("a.txt")).unwrap();
        let again = repo.add(Path::new("a.txt")).unwrap();
        assert_eq!(again.unchanged, vec!["a.txt"]);
        assert_eq!(repo.staged().unwrap(), vec!["a.txt"]);

        repo.commit("first").unwrap();
        let after = repo.add(Path::new("a.txt")).unwrap();
        assert_eq!(after.unchanged, vec!["a.txt"]);
        assert!(repo.staged().unwrap().is_empty());
    }

    #[test]
    fn empty_staging_commits_nothing() {
        let (_dir, repo) = setup();
        assert_eq!(repo.commit("empty").unwrap(), CommitOutcome::NothingToCommit);
        assert!(repo.log().unwrap().is_empty());
        assert!(repo.commit_ids().unwrap().is_empty());
    }

    #[test]
    fn modified_after_staging_aborts_commit() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "hello");
        repo.add(Path::new("a.txt")).unwrap();
        write(&dir, "a.txt", "changed");

        let err = repo.commit("racy").unwrap_err();
        match err {
            SdkError::RaceDetected { paths } => assert_eq!(paths, vec!["a.txt"]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(repo.staged().unwrap(), vec!["a.txt"]);
        assert!(repo.log().unwrap().is_empty());
        assert!(repo.commit_ids().unwrap().is_empty());
    }

    #[test]
    fn deleted_after_staging_aborts_commit() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "hello");
        repo.add(Path::new("a.txt")).unwrap();
        fs::remove_file(dir.path().join("a.txt")).unwrap();
        assert!(matches!(repo.commit("gone"), Err(SdkError::RaceDetected { .. })));
    }

    #[test]
    fn second_commit_reports_modified_files() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "hello");
        commit_file(&repo, "a.txt", "first");
        write(&dir, "a.txt", "world");
        write(&dir, "b.txt", "b");
        repo.add_all().unwrap();

        let outcome = repo.commit("second").unwrap();
        let summary = outcome.summary().unwrap();
        assert_eq!(summary.commit.commit_id.as_str(), "20241025163309000000");
        assert_eq!(summary.modified_files, vec!["a.txt"]);
        assert_eq!(summary.new_files, vec!["b.txt"]);
    }

    #[test]
    fn frozen_clock_still_yields_increasing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let config = RepoConfig::new(dir.path())
            .with_clock(SteppingClock::frozen(at("2024-10-25 16:33:08")));
        let (repo, _) = Repository::init(config).unwrap();

        write(&dir, "a.txt", "1");
        let first = commit_file(&repo, "a.txt", "one");
        write(&dir, "a.txt", "2");
        let second = commit_file(&repo, "a.txt", "two");
        assert_eq!(first.as_str(), "20241025163308000000");
        assert_eq!(second.as_str(), "20241025163308000001");
    }

    #[test]
    fn add_rejects_missing_and_outside_paths() {
        let (_dir, repo) = setup();
        assert!(matches!(
            repo.add(Path::new("nope.txt")),
            Err(SdkError::FileNotFound(p)) if p == "nope.txt"
        ));
        assert!(matches!(
            repo.add(Path::new("../elsewhere.txt")),
            Err(SdkError::InvalidPath(_))
        ));
    }

    #[test]
    fn add_paths_keeps_going_past_bad_entries() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "a");
        write(&dir, "b.txt", "b");

        let paths: Vec<PathBuf> = ["a.txt", "missing.txt", "../outside.txt", "b.txt"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let report = repo.add_paths(&paths).unwrap();

        assert_eq!(report.staged, vec!["a.txt", "b.txt"]);
        let failed: Vec<&str> = report.failures.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(failed, vec!["missing.txt", "../outside.txt"]);
        assert!(!report.is_clean());
        assert_eq!(repo.staged().unwrap(), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn log_with_malformed_id_does_not_block_commits() {
        let (dir, repo) = setup();
        write(
            &dir,
            ".mama/log.json",
            r#"[{"commit_id": "abc", "message": "x", "files": [], "timestamp": "2024-10-25 16:33:08"}]"#,
        );
        write(&dir, "a.txt", "a");
        let id = commit_file(&repo, "a.txt", "first");
        assert_eq!(id.as_str(), "20241025163308000000");
        assert_eq!(repo.log().unwrap().len(), 1);
    }

    #[test]
    fn failed_log_append_discards_snapshot() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "a");
        repo.add(Path::new("a.txt")).unwrap();

        let id = CommitId::parse("20241025163308000000").unwrap();
        let staged = repo.staged().unwrap();
        repo.store.create_snapshot(&id, dir.path(), &staged).unwrap();
        let records = vec![FileRecord::new("a.txt", ContentHasher::hash_bytes(b"a"))];
        let commit = Commit::new(id.clone(), "first", records, &at("2024-10-25 16:33:08"));

        let unwritable = CommitLog::new(dir.path().join("no-such-dir").join("log.json"));
        assert!(repo.record_commit(&unwritable, &commit, repo.tracked().unwrap()).is_err());
        assert!(repo.commit_ids().unwrap().is_empty());
        assert!(repo.log().unwrap().is_empty());
    }

    #[test]
    fn failed_tracked_save_drops_log_entry_and_snapshot() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "a");
        repo.add(Path::new("a.txt")).unwrap();

        let id = CommitId::parse("20241025163308000000").unwrap();
        let staged = repo.staged().unwrap();
        repo.store.create_snapshot(&id, dir.path(), &staged).unwrap();
        let records = vec![FileRecord::new("a.txt", ContentHasher::hash_bytes(b"a"))];
        let commit = Commit::new(id.clone(), "first", records, &at("2024-10-25 16:33:08"));

        let unsaveable =
            TrackedFileIndex::load(dir.path().join("no-such-dir").join("track.json")).unwrap();
        assert!(repo.record_commit(&repo.log, &commit, unsaveable).is_err());
        assert!(repo.commit_ids().unwrap().is_empty());
        assert!(repo.log().unwrap().is_empty());
        // Staging is untouched, so the commit can be retried.
        assert_eq!(repo.staged().unwrap(), vec!["a.txt"]);
        assert!(matches!(repo.commit("retry").unwrap(), CommitOutcome::Committed(_)));
    }

    #[test]
    fn exclusions_apply_to_add() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "a");
        write(&dir, "venv/lib/x.py", "x");
        write(&dir, "node_modules/pkg/index.js", "js");
        write(&dir, "build/out.bin", "bin");
        write(&dir, "logs/today.log", "log");
        write(&dir, ".mama_bad_dao", "build\n\n");
        write(&dir, ".mama/config.toml", "exclude = [\"logs\"]\n");

        let report = repo.add_all().unwrap();
        assert_eq!(report.staged, vec![".mama_bad_dao", "a.txt"]);

        let explicit = repo.add(Path::new("venv/lib/x.py")).unwrap();
        assert_eq!(explicit.excluded, vec!["venv/lib/x.py"]);
        assert!(!repo.staged().unwrap().contains(&"venv/lib/x.py".to_string()));
    }

    #[test]
    fn add_directory_stages_nested_files() {
        let (dir, repo) = setup();
        write(&dir, "src/lib.rs", "lib");
        write(&dir, "src/util/mod.rs", "util");
        write(&dir, "top.txt", "top");

        let report = repo.add(Path::new("src")).unwrap();
        assert_eq!(report.staged, vec!["src/lib.rs", "src/util/mod.rs"]);

        let all = repo.add(Path::new(".")).unwrap();
        assert_eq!(all.staged, vec!["top.txt"]);
    }

    // ---- Status ----

    #[test]
    fn status_classifies_files() {
        let (dir, repo) = setup();
        write(&dir, "kept.txt", "kept");
        write(&dir, "edited.txt", "v1");
        write(&dir, "removed.txt", "bye");
        repo.add_all().unwrap();
        repo.commit("base").unwrap();

        write(&dir, "edited.txt", "v2");
        fs::remove_file(dir.path().join("removed.txt")).unwrap();
        write(&dir, "staged.txt", "new");
        repo.add(Path::new("staged.txt")).unwrap();
        write(&dir, "loose.txt", "loose");

        let status = repo.status().unwrap();
        assert_eq!(status.staged, vec![StatusEntry::new("staged.txt", FileStatus::New)]);
        assert_eq!(status.modified, vec!["edited.txt"]);
        assert_eq!(status.deleted, vec!["removed.txt"]);
        assert_eq!(status.untracked, vec!["loose.txt"]);
    }

    #[test]
    fn clean_tree_has_clean_status() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "a");
        commit_file(&repo, "a.txt", "first");
        assert!(repo.status().unwrap().is_clean());
    }

    // ---- Log ----

    #[test]
    fn commit_details_finds_by_id() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "a");
        let id = commit_file(&repo, "a.txt", "first");
        assert_eq!(repo.commit_details(&id).unwrap().message, "first");

        let missing = CommitId::parse("20000101000000").unwrap();
        assert!(matches!(
            repo.commit_details(&missing),
            Err(SdkError::CommitNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn corrupt_log_reads_as_empty() {
        let (dir, repo) = setup();
        write(&dir, ".mama/log.json", "{not json");
        assert!(repo.log().unwrap().is_empty());
    }

    // ---- Diff ----

    #[test]
    fn diff_latest_with_previous_shows_added_line() {
        let (dir, repo) = setup();
        write(&dir, "f.txt", "line1\n");
        let c1 = commit_file(&repo, "f.txt", "one");
        write(&dir, "f.txt", "line1\nline2\n");
        let c2 = commit_file(&repo, "f.txt", "two");

        let cmp = repo.diff(&DiffTarget::LatestWithPrevious).unwrap();
        assert_eq!(cmp.old, Side::Commit(c1.clone()));
        assert_eq!(cmp.new, Side::Commit(c2.clone()));
        let modified: Vec<_> = cmp.modified().collect();
        assert_eq!(modified.len(), 1);
        assert_eq!(modified[0].0, "f.txt");
        assert_eq!(modified[0].1.additions(), 1);
        assert_eq!(modified[0].1.deletions(), 0);
        assert!(cmp.render().contains("+line2\n"));

        let explicit = repo.diff(&DiffTarget::Commits(c1, c2)).unwrap();
        assert_eq!(explicit, cmp);
    }

    #[test]
    fn diff_needs_two_commits() {
        let (dir, repo) = setup();
        write(&dir, "f.txt", "x");
        commit_file(&repo, "f.txt", "one");
        assert!(matches!(
            repo.compare_latest_with_previous(),
            Err(SdkError::NoPreviousCommit)
        ));
    }

    #[test]
    fn diff_against_working_tree() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "old\n");
        write(&dir, "gone.txt", "gone");
        repo.add_all().unwrap();
        let c1 = match repo.commit("base").unwrap() {
            CommitOutcome::Committed(s) => s.commit.commit_id,
            CommitOutcome::NothingToCommit => unreachable!(),
        };

        write(&dir, "a.txt", "new\n");
        fs::remove_file(dir.path().join("gone.txt")).unwrap();
        write(&dir, "b.txt", "b");
        repo.add(Path::new("b.txt")).unwrap();

        let cmp = repo.diff(&DiffTarget::WorkingTree(c1)).unwrap();
        assert_eq!(cmp.new, Side::WorkingTree);
        assert_eq!(cmp.added().collect::<Vec<_>>(), vec!["b.txt"]);
        assert_eq!(cmp.deleted().collect::<Vec<_>>(), vec!["gone.txt"]);
        let modified: Vec<_> = cmp.modified().map(|(p, _)| p).collect();
        assert_eq!(modified, vec!["a.txt"]);
        assert!(cmp.render().contains("+++ working/a.txt\n"));
    }

    // ---- Rollback ----

    #[test]
    fn rollback_restores_content_and_truncates_history() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "hello");
        let c1 = commit_file(&repo, "a.txt", "first");
        write(&dir, "a.txt", "world");
        commit_file(&repo, "a.txt", "second");

        let report = repo.rollback(Some(&c1)).unwrap();
        assert!(report.is_clean());
        assert_eq!(read(&dir, "a.txt"), "hello");
        assert_eq!(repo.commit_ids().unwrap(), vec![c1.clone()]);
        assert_eq!(repo.log().unwrap().len(), 1);
        assert_eq!(
            repo.tracked().unwrap().get("a.txt"),
            Some(&ContentHasher::hash_bytes(b"hello"))
        );
        assert_eq!(repo.last_rollback().unwrap().unwrap().rollback_to, c1);
    }

    #[test]
    fn rollback_without_target_uses_previous_commit() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "hello");
        let c1 = commit_file(&repo, "a.txt", "first");
        write(&dir, "b.txt", "later");
        commit_file(&repo, "b.txt", "second");

        let report = repo.rollback(None).unwrap();
        assert_eq!(report.target, c1);
        assert_eq!(report.deleted, vec!["b.txt"]);
        assert!(!dir.path().join("b.txt").exists());
        assert!(!repo.tracked().unwrap().contains("b.txt"));

        assert!(matches!(repo.rollback(None), Err(SdkError::NoPreviousCommit)));
    }

    #[test]
    fn rollback_to_unknown_commit_fails() {
        let (_dir, repo) = setup();
        let id = CommitId::parse("20000101000000").unwrap();
        assert!(matches!(repo.rollback_to(&id), Err(SdkError::CommitNotFound(_))));
    }

    #[test]
    fn rollback_recreates_deleted_nested_files() {
        let (dir, repo) = setup();
        write(&dir, "src/lib.rs", "fn main() {}\n");
        let c1 = commit_file(&repo, "src", "first");
        fs::remove_dir_all(dir.path().join("src")).unwrap();

        repo.rollback_to(&c1).unwrap();
        assert_eq!(read(&dir, "src/lib.rs"), "fn main() {}\n");
    }

    #[test]
    fn rollback_drops_staged_files_not_in_history() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "a");
        let c1 = commit_file(&repo, "a.txt", "first");
        write(&dir, "c.txt", "pending");
        repo.add(Path::new("c.txt")).unwrap();

        let report = repo.rollback_to(&c1).unwrap();
        assert_eq!(report.unstaged, vec!["c.txt"]);
        assert!(repo.staged().unwrap().is_empty());
        assert!(!repo.tracked().unwrap().contains("c.txt"));
        assert_eq!(read(&dir, "c.txt"), "pending");
        assert_eq!(repo.status().unwrap().untracked, vec!["c.txt"]);
    }

    #[test]
    fn rollback_keeps_log_and_snapshots_in_step() {
        let (dir, repo) = setup();
        let mut ids = Vec::new();
        for n in 0..3 {
            write(&dir, "a.txt", &format!("v{n}"));
            ids.push(commit_file(&repo, "a.txt", &format!("c{n}")));
        }

        let report = repo.rollback_to(&ids[1]).unwrap();
        assert_eq!(report.pruned, vec![ids[2].clone()]);
        let logged: Vec<CommitId> = repo.log().unwrap().into_iter().map(|c| c.commit_id).collect();
        assert_eq!(logged, ids[..2].to_vec());
        assert_eq!(repo.commit_ids().unwrap(), ids[..2].to_vec());
        assert_eq!(read(&dir, "a.txt"), "v1");

        // New commits continue after the surviving history.
        write(&dir, "a.txt", "v3");
        let next = commit_file(&repo, "a.txt", "c3");
        assert!(next > ids[1]);
    }
}
