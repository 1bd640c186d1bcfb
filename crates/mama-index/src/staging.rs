use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use mama_store::write_atomic;
use tracing::debug;

use crate::error::IndexResult;

/// The staging list in `index.txt`: one repo-relative path per line.
///
/// Append order is preserved. Duplicates on disk are harmless; [`list`]
/// drops them at read time.
///
/// [`list`]: StagingArea::list
#[derive(Clone, Debug)]
pub struct StagingArea {
    path: PathBuf,
}

impl StagingArea {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Staged paths in first-staged order, without duplicates.
    pub fn list(&self) -> IndexResult<Vec<String>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut staged: Vec<String> = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !staged.iter().any(|s| s == line) {
                staged.push(line.to_string());
            }
        }
        Ok(staged)
    }

    pub fn is_staged(&self, key: &str) -> IndexResult<bool> {
        Ok(self.list()?.iter().any(|s| s == key))
    }

    /// Queue `key`. Returns `false` if it was already staged.
    pub fn append(&self, key: &str) -> IndexResult<bool> {
        if self.is_staged(key)? {
            return Ok(false);
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{key}")?;
        debug!(path = key, "staged");
        Ok(true)
    }

    /// Empty the list.
    pub fn clear(&self) -> IndexResult<()> {
        write_atomic(&self.path, b"")?;
        Ok(())
    }

    pub fn is_empty(&self) -> IndexResult<bool> {
        Ok(self.list()?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, StagingArea) {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path().join("index.txt"));
        (dir, staging)
    }

    #[test]
    fn append_is_idempotent() {
        let (_dir, staging) = setup();
        assert!(staging.append("a.txt").unwrap());
        assert!(!staging.append("a.txt").unwrap());
        assert!(staging.append("b.txt").unwrap());
        assert_eq!(staging.list().unwrap(), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn list_dedups_existing_file() {
        let (_dir, staging) = setup();
        fs::write(staging.path(), "b.txt\na.txt\nb.txt\n\n").unwrap();
        assert_eq!(staging.list().unwrap(), vec!["b.txt", "a.txt"]);
    }

    #[test]
    fn clear_empties_and_survives_reopen() {
        let (dir, staging) = setup();
        staging.append("a.txt").unwrap();
        staging.clear().unwrap();
        let reopened = StagingArea::new(dir.path().join("index.txt"));
        assert!(reopened.is_empty().unwrap());
    }

    #[test]
    fn missing_file_is_empty() {
        let (_dir, staging) = setup();
        assert!(staging.list().unwrap().is_empty());
        assert!(!staging.is_staged("a.txt").unwrap());
    }
}
