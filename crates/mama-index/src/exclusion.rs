//! Path eligibility rules.
//!
//! An exclusion entry is a literal path prefix. Entries and candidate paths
//! are both resolved against the working directory and normalized lexically
//! before comparison, and prefixes match whole components: `venv` excludes
//! `venv/lib.py` but not `venvx.txt`.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{IndexError, IndexResult};

/// The set of excluded path prefixes for one working directory.
///
/// Rebuilt at the start of every top-level operation so edits to the ignore
/// file take effect immediately.
#[derive(Clone, Debug)]
pub struct ExclusionSet {
    workdir: PathBuf,
    entries: Vec<PathBuf>,
}

impl ExclusionSet {
    /// An empty set for `workdir`.
    pub fn new(workdir: &Path) -> Self {
        Self {
            workdir: normalize(workdir),
            entries: Vec::new(),
        }
    }

    /// Build the full set: `builtin` prefixes, one prefix per non-blank line
    /// of `ignore_file` (if it exists), then `extra`.
    pub fn load(
        workdir: &Path,
        builtin: &[String],
        ignore_file: &Path,
        extra: &[String],
    ) -> IndexResult<Self> {
        let mut set = Self::new(workdir);
        for entry in builtin {
            set.add(entry);
        }

        match fs::read_to_string(ignore_file) {
            Ok(text) => {
                for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                    set.add(line);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        for entry in extra {
            set.add(entry);
        }
        debug!(entries = set.entries.len(), "exclusion set loaded");
        Ok(set)
    }

    /// Add one prefix, relative to the working directory unless absolute.
    pub fn add(&mut self, prefix: &str) {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return;
        }
        let resolved = normalize(&self.workdir.join(prefix));
        if !self.entries.contains(&resolved) {
            self.entries.push(resolved);
        }
    }

    /// Returns `true` if `path` lies at or under any excluded prefix.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        let candidate = normalize(&self.workdir.join(path));
        self.entries.iter().any(|prefix| candidate.starts_with(prefix))
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }
}

/// Absolute, lexically normalized form of `path`.
///
/// `.` components are dropped and `..` pops its parent. Symlinks are not
/// resolved.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Repo-relative, `/`-separated key for `path`.
///
/// Relative paths are taken relative to `workdir`. Paths that resolve to
/// the working directory itself or anywhere outside it are rejected.
pub fn relative_key(workdir: &Path, path: &Path) -> IndexResult<String> {
    let root = normalize(workdir);
    let resolved = normalize(&root.join(path));
    let rel = resolved
        .strip_prefix(&root)
        .map_err(|_| IndexError::InvalidPath(path.display().to_string()))?;

    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return Err(IndexError::InvalidPath(path.display().to_string()));
    }
    Ok(parts.join("/"))
}
