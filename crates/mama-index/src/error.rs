//! Error types for the index crate.

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The file to stage does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// The path is outside the working directory or cannot be keyed.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Hashing failed for a reason other than a missing file.
    #[error("hash error: {0}")]
    Hasher(#[from] mama_crypto::HasherError),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] mama_store::StoreError),

    /// I/O error on index files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
