//! High-level SDK for mama.
//!
//! Provides a single entry point over staging, commits, status, diffs, and
//! rollback for one working directory. This is what the CLI and any
//! embedding application should use.
//!
//! # Key Types
//!
//! - [`Repository`] -- Facade over one working directory and its metadata
//! - [`RepoConfig`] -- Workdir, metadata dir name, exclusions, clock
//! - [`CommitOutcome`] -- A new commit, or nothing staged
//! - [`Comparison`] -- Path-level and line-level differences for display
//! - [`RollbackReport`] -- What a rollback deleted, restored, and pruned

pub mod commit;
pub mod compare;
pub mod config;
pub mod error;
pub mod repository;
pub mod rollback;

pub use commit::{AddFailure, AddReport, CommitOutcome, CommitSummary, InitOutcome};
pub use compare::{Comparison, DiffTarget, FileChange, Side};
pub use config::{
    Clock, DiffSettings, RepoConfig, RepoSettings, SteppingClock, SystemClock,
    DEFAULT_METADATA_DIR,
};
pub use error::{SdkError, SdkResult};
pub use repository::Repository;
pub use rollback::{RollbackFailure, RollbackReport};

// Re-export key types
pub use mama_diff::{BlobDiff, DiffHunk, DiffLine};
pub use mama_index::{FileStatus, StatusEntry, WorkdirStatus};
pub use mama_types::{Commit, CommitId, Digest, FileRecord, RollbackMarker};
