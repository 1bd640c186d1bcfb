//! Whole-file metadata persistence.
//!
//! Writers go through a [`NamedTempFile`] in the destination directory and an
//! atomic rename, so a crash leaves either the old or the new file on disk.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{StoreError, StoreResult};

const JSON_INDENT: &[u8] = b"    ";

/// Replace `path` with `bytes` atomically.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::InvalidPath(path.to_path_buf()))?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Pretty JSON with four-space indentation.
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> StoreResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(JSON_INDENT));
    value
        .serialize(&mut ser)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(out)
}

/// Serialize `value` and replace `path` with it atomically.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    write_atomic(path, &to_json_pretty(value)?)
}

/// Read a JSON metadata file strictly.
///
/// A missing or blank file is `Ok(None)`. Content that does not parse is
/// [`StoreError::CorruptedMetadata`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|e| StoreError::CorruptedMetadata {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Read a JSON metadata file, treating corruption as absence.
///
/// Parse failures are logged and yield `T::default()`; other I/O errors
/// still propagate.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> StoreResult<T> {
    match read_json(path) {
        Ok(value) => Ok(value.unwrap_or_default()),
        Err(StoreError::CorruptedMetadata { path, reason }) => {
            warn!(path = %path.display(), %reason, "corrupted metadata, starting empty");
            Ok(T::default())
        }
        Err(e) => Err(e),
    }
}
