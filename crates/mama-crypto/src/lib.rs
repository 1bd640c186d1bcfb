//! Content hashing for mama.
//!
//! Every file fingerprint in the repository is a plain SHA-256 of the file's
//! bytes, computed in fixed-size chunks so large files never sit in memory.

pub mod hasher;

pub use hasher::{ContentHasher, HasherError, DEFAULT_CHUNK_SIZE};
