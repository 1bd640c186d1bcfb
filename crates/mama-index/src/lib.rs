//! Working tree tracking for mama.
//!
//! Decides which files are eligible for tracking, remembers the last digest
//! seen for every tracked path, and maintains the staging list between the
//! working directory and the next commit.
//!
//! # Key Types
//!
//! - [`ExclusionSet`] -- Built-in, ignore-file, and configured path prefixes
//! - [`TrackedFileIndex`] -- Persistent path to digest mapping (`track.json`)
//! - [`StagingArea`] -- Ordered staging list (`index.txt`)
//! - [`WorkdirStatus`] -- Result of [`compute_status`]
//! - [`FileStatus`] -- Kind of staged change (New, Modified)
//!
//! Paths are keyed repo-relative with `/` separators; see [`relative_key`].

pub mod error;
pub mod exclusion;
pub mod staging;
pub mod status;
pub mod tracked;
pub mod walk;

pub use error::{IndexError, IndexResult};
pub use exclusion::{normalize, relative_key, ExclusionSet};
pub use staging::StagingArea;
pub use status::{compute_status, FileStatus, StatusEntry, WorkdirStatus};
pub use tracked::{StageOutcome, TrackedFileIndex};
pub use walk::{walk_dir, walk_workdir, WalkFailure, WalkReport};
