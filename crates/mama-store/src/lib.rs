//! On-disk storage for mama.
//!
//! Everything the repository persists lives under a single metadata root
//! (`.mama/` by default). This crate owns that layout and the primitives that
//! read and write it; it knows nothing about staging or exclusion rules.
//!
//! # Key Types
//!
//! - [`RepoLayout`] -- resolves every metadata path from the working directory
//! - [`CommitStore`] -- one directory of full-file copies per commit
//! - [`CommitLog`] -- the ordered commit history in `log.json`
//! - [`RollbackJournal`] -- the last-rollback marker in `rollback.json`
//!
//! # Design Rules
//!
//! 1. Metadata files are rewritten whole, via a temp file and an atomic rename.
//! 2. Snapshots are immutable once created; only rollback deletes them.
//! 3. Corrupted JSON is recoverable: tolerant loaders warn and start empty,
//!    `*_checked` loaders report [`StoreError::CorruptedMetadata`].

pub mod error;
pub mod journal;
pub mod layout;
pub mod log;
pub mod persist;
pub mod snapshot;

pub use error::{StoreError, StoreResult};
pub use journal::RollbackJournal;
pub use layout::RepoLayout;
pub use log::CommitLog;
pub use persist::{read_json, read_json_or_default, to_json_pretty, write_atomic, write_json_atomic};
pub use snapshot::CommitStore;
