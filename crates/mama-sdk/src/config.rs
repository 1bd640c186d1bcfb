use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{Duration, Local, NaiveDateTime};
use mama_crypto::DEFAULT_CHUNK_SIZE;
use mama_diff::DEFAULT_CONTEXT_LINES;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default metadata directory name.
pub const DEFAULT_METADATA_DIR: &str = ".mama";

/// Appended to the metadata directory name to form the ignore file name.
const IGNORE_FILE_SUFFIX: &str = "_bad_dao";

/// Directories never tracked, besides the metadata directory itself.
const DEFAULT_EXCLUSIONS: &[&str] = &["venv", "node_modules"];

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of local wall-clock time for commit ids and timestamps.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> NaiveDateTime;
}

/// The system's local time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Deterministic clock: returns `start`, then advances by `step` per call.
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<NaiveDateTime>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(start: NaiveDateTime, step: Duration) -> Self {
        Self {
            next: Mutex::new(start),
            step,
        }
    }

    /// A clock that never advances.
    pub fn frozen(at: NaiveDateTime) -> Self {
        Self::new(at, Duration::zero())
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> NaiveDateTime {
        let mut next = self.next.lock().unwrap_or_else(|p| p.into_inner());
        let now = *next;
        *next = now.checked_add_signed(self.step).unwrap_or(now);
        now
    }
}

// ---------------------------------------------------------------------------
// RepoConfig
// ---------------------------------------------------------------------------

/// Everything a [`Repository`](crate::Repository) needs to know about where
/// and how it runs.
#[derive(Clone, Debug)]
pub struct RepoConfig {
    /// The working directory under version control.
    pub workdir: PathBuf,
    /// Name of the metadata directory inside `workdir`.
    pub metadata_dir: String,
    /// Path prefixes (relative to `workdir`) never tracked. The metadata
    /// directory is always excluded in addition to these.
    pub builtin_exclusions: Vec<String>,
    /// Ignore file name override; defaults to `<metadata_dir>_bad_dao`.
    pub ignore_file: Option<String>,
    /// Context lines around diff hunks, unless `config.toml` overrides it.
    pub diff_context: usize,
    /// Read size when hashing files.
    pub hash_chunk_size: usize,
    pub clock: Arc<dyn Clock>,
}

impl RepoConfig {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            metadata_dir: DEFAULT_METADATA_DIR.to_string(),
            builtin_exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
            ignore_file: None,
            diff_context: DEFAULT_CONTEXT_LINES,
            hash_chunk_size: DEFAULT_CHUNK_SIZE,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_metadata_dir(mut self, name: impl Into<String>) -> Self {
        self.metadata_dir = name.into();
        self
    }

    pub fn with_exclusion(mut self, prefix: impl Into<String>) -> Self {
        self.builtin_exclusions.push(prefix.into());
        self
    }

    pub fn with_ignore_file(mut self, name: impl Into<String>) -> Self {
        self.ignore_file = Some(name.into());
        self
    }

    pub fn with_diff_context(mut self, lines: usize) -> Self {
        self.diff_context = lines;
        self
    }

    pub fn with_hash_chunk_size(mut self, bytes: usize) -> Self {
        self.hash_chunk_size = bytes;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn ignore_file_name(&self) -> String {
        self.ignore_file
            .clone()
            .unwrap_or_else(|| format!("{}{IGNORE_FILE_SUFFIX}", self.metadata_dir))
    }

    /// Built-in exclusions with the metadata directory first.
    pub fn exclusions(&self) -> Vec<String> {
        std::iter::once(self.metadata_dir.clone())
            .chain(self.builtin_exclusions.iter().cloned())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// RepoSettings (config.toml)
// ---------------------------------------------------------------------------

/// Optional per-repository settings read from `<metadata>/config.toml`.
///
/// ```toml
/// exclude = ["build", "secrets/key.pem"]
///
/// [diff]
/// context_lines = 5
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSettings {
    /// Extra exclusion prefixes, relative to the working directory.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub diff: DiffSettings,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSettings {
    #[serde(default)]
    pub context_lines: Option<usize>,
}

impl RepoSettings {
    /// Load settings from `path`. Missing or malformed files yield defaults.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read settings, using defaults");
                return Self::default();
            }
        };
        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed settings, using defaults");
                Self::default()
            }
        }
    }
}
