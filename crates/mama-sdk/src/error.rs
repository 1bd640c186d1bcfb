use std::path::PathBuf;

use mama_types::CommitId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("repository not initialized at {}", .0.display())]
    NotInitialized(PathBuf),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("staged files changed since they were added: {}", .paths.join(", "))]
    RaceDetected { paths: Vec<String> },

    #[error("commit not found: {0}")]
    CommitNotFound(CommitId),

    #[error("no previous commit")]
    NoPreviousCommit,

    #[error("index error: {0}")]
    Index(mama_index::IndexError),

    #[error("store error: {0}")]
    Store(mama_store::StoreError),

    #[error("invalid value: {0}")]
    Type(#[from] mama_types::TypeError),

    #[error("hash error: {0}")]
    Hasher(#[from] mama_crypto::HasherError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<mama_store::StoreError> for SdkError {
    fn from(err: mama_store::StoreError) -> Self {
        match err {
            mama_store::StoreError::CommitNotFound(id) => Self::CommitNotFound(id),
            other => Self::Store(other),
        }
    }
}

impl From<mama_index::IndexError> for SdkError {
    fn from(err: mama_index::IndexError) -> Self {
        match err {
            mama_index::IndexError::FileNotFound(path) => Self::FileNotFound(path),
            mama_index::IndexError::InvalidPath(path) => Self::InvalidPath(path),
            mama_index::IndexError::Store(store) => store.into(),
            other => Self::Index(other),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
