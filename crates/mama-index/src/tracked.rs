use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mama_crypto::ContentHasher;
use mama_store::{read_json, read_json_or_default, write_json_atomic};
use mama_types::{Digest, FileRecord};
use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::staging::StagingArea;

/// Result of [`TrackedFileIndex::stage_if_changed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    /// The digest changed (or the path was new) and the path is now staged.
    Staged(Digest),
    /// Content matches the tracked digest; nothing was written.
    Unchanged,
}

/// Last-known digest of every tracked path, persisted in `track.json`.
///
/// Last write wins per path. [`save`](Self::save) rewrites the whole file.
#[derive(Clone, Debug)]
pub struct TrackedFileIndex {
    path: PathBuf,
    entries: BTreeMap<String, Digest>,
}

impl TrackedFileIndex {
    /// Load from `path`. A missing or corrupted file yields an empty index.
    pub fn load(path: impl Into<PathBuf>) -> IndexResult<Self> {
        let path = path.into();
        let entries = read_json_or_default(&path)?;
        Ok(Self { path, entries })
    }

    /// Load from `path`, reporting corruption instead of resetting.
    pub fn load_checked(path: impl Into<PathBuf>) -> IndexResult<Self> {
        let path = path.into();
        let entries = read_json(&path)?.unwrap_or_default();
        Ok(Self { path, entries })
    }

    pub fn save(&self) -> IndexResult<()> {
        write_json_atomic(&self.path, &self.entries)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get(&self, key: &str) -> Option<&Digest> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn entries(&self) -> &BTreeMap<String, Digest> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -----------------------------------------------------------------------
    // Mutations (in memory; call `save` to persist)
    // -----------------------------------------------------------------------

    pub fn set(&mut self, key: impl Into<String>, digest: Digest) {
        self.entries.insert(key.into(), digest);
    }

    /// Record committed digests; the commit's value wins.
    pub fn merge(&mut self, records: &[FileRecord]) {
        for record in records {
            self.entries.insert(record.file_name.clone(), record.hash);
        }
    }

    /// Forget `keys`. Returns how many were tracked.
    pub fn remove_paths<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) -> usize {
        keys.into_iter()
            .filter(|k| self.entries.remove(*k).is_some())
            .count()
    }

    // -----------------------------------------------------------------------
    // Staging
    // -----------------------------------------------------------------------

    /// Hash `file` and stage `key` if its digest differs from the tracked one.
    ///
    /// On change the new digest is written through to disk before the path
    /// is appended to `staging`.
    pub fn stage_if_changed(
        &mut self,
        key: &str,
        file: &Path,
        hasher: &ContentHasher,
        staging: &StagingArea,
    ) -> IndexResult<StageOutcome> {
        let digest = hasher.hash_file(file).map_err(|e| {
            if e.is_not_found() {
                IndexError::FileNotFound(key.to_string())
            } else {
                IndexError::Hasher(e)
            }
        })?;

        if self.get(key) == Some(&digest) {
            return Ok(StageOutcome::Unchanged);
        }

        debug!(path = key, digest = %digest.short_hex(), "content changed");
        self.set(key, digest);
        self.save()?;
        staging.append(key)?;
        Ok(StageOutcome::Staged(digest))
    }
}
