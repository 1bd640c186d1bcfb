//! Diff engine for mama.
//!
//! Display-only comparison of file contents and of the file sets of two
//! snapshots. Nothing here touches the filesystem.
//!
//! # Key Types
//!
//! - [`BlobDiff`] / [`DiffHunk`] / [`DiffLine`] -- Line-level blob diff with unified rendering
//! - [`SnapshotDiff`] -- Added, removed, and modified paths between two digest maps

pub mod blob_diff;
pub mod file_set;

pub use blob_diff::{diff_blobs, diff_blobs_with_context, BlobDiff, DiffHunk, DiffLine, DEFAULT_CONTEXT_LINES};
pub use file_set::{diff_file_sets, SnapshotDiff};
