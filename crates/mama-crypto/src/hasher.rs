use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use mama_types::Digest;
use sha2::{Digest as _, Sha256};
use tracing::trace;

/// Read size used when streaming file contents through the hasher.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Streaming SHA-256 content hasher.
///
/// Digests carry no domain tag, so a digest recorded in `track.json` equals
/// `sha256sum` of the file.
#[derive(Clone, Copy, Debug)]
pub struct ContentHasher {
    chunk_size: usize,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ContentHasher {
    /// Create a hasher with a custom read size. Zero falls back to the default.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: if chunk_size == 0 {
                DEFAULT_CHUNK_SIZE
            } else {
                chunk_size
            },
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Hash an in-memory buffer.
    pub fn hash_bytes(data: &[u8]) -> Digest {
        Digest::from_hash(Sha256::digest(data).into())
    }

    /// Hash everything readable from `reader`.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<Digest> {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
        }
        Ok(Digest::from_hash(hasher.finalize().into()))
    }

    /// Hash the file at `path`.
    pub fn hash_file(&self, path: &Path) -> Result<Digest, HasherError> {
        let io_err = |source| HasherError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_err)?;
        let digest = self.hash_reader(file).map_err(io_err)?;
        trace!(path = %path.display(), digest = %digest.short_hex(), "hashed file");
        Ok(digest)
    }

    /// Check that the file at `path` hashes to `expected`.
    pub fn verify_file(&self, path: &Path, expected: &Digest) -> Result<bool, HasherError> {
        Ok(self.hash_file(path)? == *expected)
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error)]
pub enum HasherError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HasherError {
    /// Returns `true` when the file vanished before it could be read.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } => path,
        }
    }
}
