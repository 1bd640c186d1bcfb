use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mama_types::CommitId;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};

/// Snapshot storage: `commits/<commit_id>/` holds a full copy of every file
/// staged for that commit, stored under its repo-relative path.
///
/// Snapshots written by older versions stored bare filenames; lookups fall
/// back to the basename so those remain readable.
#[derive(Clone, Debug)]
pub struct CommitStore {
    dir: PathBuf,
}

impl CommitStore {
    /// Store rooted at a `commits/` directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot_dir(&self, id: &CommitId) -> PathBuf {
        self.dir.join(id.as_str())
    }

    pub fn exists(&self, id: &CommitId) -> bool {
        self.snapshot_dir(id).is_dir()
    }

    // -----------------------------------------------------------------------
    // Writing
    // -----------------------------------------------------------------------

    /// Copy each of `files` (repo-relative) from `workdir` into a new
    /// snapshot directory for `id`.
    ///
    /// Fails with [`StoreError::SnapshotExists`] if the directory is already
    /// there. If any copy fails the partial snapshot is removed.
    pub fn create_snapshot(&self, id: &CommitId, workdir: &Path, files: &[String]) -> StoreResult<PathBuf> {
        let target = self.snapshot_dir(id);
        fs::create_dir_all(&self.dir)?;
        match fs::create_dir(&target) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StoreError::SnapshotExists(id.clone()));
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = copy_files(workdir, &target, files) {
            if let Err(cleanup) = fs::remove_dir_all(&target) {
                warn!(commit = %id, error = %cleanup, "failed to remove partial snapshot");
            }
            return Err(e);
        }

        debug!(commit = %id, files = files.len(), "snapshot created");
        Ok(target)
    }

    /// Remove the snapshot for `id`. Returns `false` if it did not exist.
    pub fn delete_snapshot(&self, id: &CommitId) -> StoreResult<bool> {
        match fs::remove_dir_all(self.snapshot_dir(id)) {
            Ok(()) => {
                debug!(commit = %id, "snapshot deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    /// Every snapshot id on disk, oldest first.
    ///
    /// Entries whose names are not valid commit ids are ignored.
    pub fn list_commit_ids(&self) -> StoreResult<Vec<CommitId>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            match name.to_str().map(CommitId::parse) {
                Some(Ok(id)) => ids.push(id),
                _ => debug!(name = ?name, "skipping non-snapshot entry"),
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Stored names in the snapshot, `/`-separated and sorted.
    pub fn stored_paths(&self, id: &CommitId) -> StoreResult<Vec<String>> {
        let dir = self.snapshot_dir(id);
        if !dir.is_dir() {
            return Err(StoreError::CommitNotFound(id.clone()));
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1) {
            let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&dir)
                .map_err(|_| StoreError::InvalidPath(entry.path().to_path_buf()))?;
            paths.push(to_slash(rel));
        }
        paths.sort();
        Ok(paths)
    }

    /// Location of the stored copy of `path`, with the legacy basename
    /// fallback. `None` if neither form is present.
    pub fn blob_path(&self, id: &CommitId, path: &str) -> Option<PathBuf> {
        let dir = self.snapshot_dir(id);
        let direct = dir.join(path);
        if direct.is_file() {
            return Some(direct);
        }
        let legacy = dir.join(Path::new(path).file_name()?);
        legacy.is_file().then_some(legacy)
    }

    /// Bytes of the stored copy of `path`.
    pub fn read_blob(&self, id: &CommitId, path: &str) -> StoreResult<Vec<u8>> {
        if !self.exists(id) {
            return Err(StoreError::CommitNotFound(id.clone()));
        }
        let blob = self
            .blob_path(id, path)
            .ok_or_else(|| StoreError::NotFound(self.snapshot_dir(id).join(path)))?;
        Ok(fs::read(blob)?)
    }

    /// Copy the stored copy of `path` to `dest`, creating parent directories.
    pub fn restore_blob(&self, id: &CommitId, path: &str, dest: &Path) -> StoreResult<()> {
        if !self.exists(id) {
            return Err(StoreError::CommitNotFound(id.clone()));
        }
        let blob = self
            .blob_path(id, path)
            .ok_or_else(|| StoreError::NotFound(self.snapshot_dir(id).join(path)))?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&blob, dest)?;
        Ok(())
    }
}

fn copy_files(workdir: &Path, target: &Path, files: &[String]) -> StoreResult<()> {
    for rel in files {
        let src = workdir.join(rel);
        let dst = target.join(rel);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        // fs::copy carries permission bits over.
        fs::copy(&src, &dst).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(src.clone()),
            _ => StoreError::Io(e),
        })?;
    }
    Ok(())
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
