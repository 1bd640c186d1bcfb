//! Foundation types for mama.
//!
//! This crate provides the identity and record types shared by every other
//! mama crate. It performs no I/O.
//!
//! # Key Types
//!
//! - [`Digest`] -- SHA-256 content fingerprint, hex-encoded on disk
//! - [`CommitId`] -- Fixed-width, timestamp-derived commit identifier
//! - [`Commit`] / [`FileRecord`] -- One entry of the commit log
//! - [`RollbackMarker`] -- Audit record of the last rollback

pub mod commit;
pub mod digest;
pub mod error;
pub mod marker;

pub use commit::{Commit, CommitId, FileRecord, TIMESTAMP_FORMAT};
pub use digest::{Digest, DIGEST_LEN};
pub use error::TypeError;
pub use marker::RollbackMarker;
