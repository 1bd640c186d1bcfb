use std::path::PathBuf;

use mama_types::CommitId;

/// Errors from metadata and snapshot storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A stored blob or other required file is missing.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// No snapshot directory or log entry exists for the commit.
    #[error("commit not found: {0}")]
    CommitNotFound(CommitId),

    /// A snapshot directory for this id already exists.
    #[error("snapshot already exists: {0}")]
    SnapshotExists(CommitId),

    /// The log already holds an entry with this id.
    #[error("duplicate commit id in log: {0}")]
    DuplicateCommit(CommitId),

    /// A metadata file could not be parsed.
    #[error("corrupted metadata in {}: {reason}", path.display())]
    CorruptedMetadata { path: PathBuf, reason: String },

    /// Serialization failure while writing metadata.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A path could not be used as a storage location.
    #[error("invalid storage path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// I/O error from the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
