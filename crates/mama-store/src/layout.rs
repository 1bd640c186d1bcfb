use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreResult;

const COMMITS_DIR: &str = "commits";
const INDEX_FILE: &str = "index.txt";
const LOG_FILE: &str = "log.json";
const TRACK_FILE: &str = "track.json";
const ROLLBACK_FILE: &str = "rollback.json";
const SETTINGS_FILE: &str = "config.toml";

/// Resolved locations of every file the repository persists.
///
/// ```text
/// <workdir>/
///   <metadata>/              e.g. .mama/
///     commits/<commit_id>/   snapshot copies
///     index.txt              staging list
///     log.json               commit log
///     track.json             tracked digests
///     rollback.json          last rollback marker
///     config.toml            optional settings
///   <ignore file>            e.g. .mama_bad_dao
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoLayout {
    workdir: PathBuf,
    root: PathBuf,
    ignore_file: PathBuf,
}

impl RepoLayout {
    /// Layout for `workdir` with the metadata directory and ignore file
    /// named relative to it.
    pub fn new(workdir: impl Into<PathBuf>, metadata_dir: &str, ignore_file: &str) -> Self {
        let workdir = workdir.into();
        Self {
            root: workdir.join(metadata_dir),
            ignore_file: workdir.join(ignore_file),
            workdir,
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// The metadata root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn commits_dir(&self) -> PathBuf {
        self.root.join(COMMITS_DIR)
    }

    pub fn index_file(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    pub fn track_file(&self) -> PathBuf {
        self.root.join(TRACK_FILE)
    }

    pub fn rollback_file(&self) -> PathBuf {
        self.root.join(ROLLBACK_FILE)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    /// User exclusion list. Lives beside the metadata root, not inside it.
    pub fn ignore_file(&self) -> &Path {
        &self.ignore_file
    }

    /// Returns `true` if the metadata root exists.
    pub fn is_initialized(&self) -> bool {
        self.root.is_dir()
    }

    /// Create the metadata root and `commits/`.
    ///
    /// Returns `false` without touching anything if the root already exists.
    pub fn create(&self) -> StoreResult<bool> {
        if self.is_initialized() {
            return Ok(false);
        }
        fs::create_dir_all(self.commits_dir())?;
        Ok(true)
    }
}
