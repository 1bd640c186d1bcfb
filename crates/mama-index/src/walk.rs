use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::exclusion::{normalize, relative_key, ExclusionSet};

/// Eligible files found under the working directory.
#[derive(Clone, Debug, Default)]
pub struct WalkReport {
    /// Repo-relative keys of regular files, in file-name order.
    pub files: Vec<String>,
    /// Entries that could not be read.
    pub failures: Vec<WalkFailure>,
}

/// A directory entry the walk had to skip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Walk the whole working directory. See [`walk_dir`].
pub fn walk_workdir(workdir: &Path, exclusions: &ExclusionSet) -> WalkReport {
    walk_dir(workdir, Path::new("."), exclusions)
}

/// Walk `start` (relative to `workdir` unless absolute), pruning excluded
/// directories and skipping excluded files.
/// Reported keys are relative to `workdir`.
///
/// Only regular files are reported; symlinks are not followed. Unreadable
/// entries are recorded in [`WalkReport::failures`] and do not stop the walk.
pub fn walk_dir(workdir: &Path, start: &Path, exclusions: &ExclusionSet) -> WalkReport {
    let root = normalize(&workdir.join(start));
    let mut report = WalkReport::default();

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !exclusions.is_excluded(e.path()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                report.failures.push(WalkFailure {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match relative_key(workdir, entry.path()) {
            Ok(key) => report.files.push(key),
            Err(e) => report.failures.push(WalkFailure {
                path: entry.path().to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }
    report
}
