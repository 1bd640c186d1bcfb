use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::TypeError;

/// Human-readable timestamp format used in `log.json` and `rollback.json`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Second-resolution prefix shared by current and legacy commit ids.
const SECONDS_FORMAT: &str = "%Y%m%d%H%M%S";
const LEGACY_LEN: usize = 14;
const ID_LEN: usize = 20;

/// Timestamp-derived commit identifier.
///
/// Current ids are 20 ASCII digits: local time as `YYYYMMDDhhmmss` followed
/// by six digits of microseconds. Ids written by older versions carry only
/// the 14-digit seconds part. Both forms are fixed width, so plain string
/// ordering is chronological ordering; a legacy id sorts before every
/// current id that shares its second.
///
/// Deserialization runs the same validation as [`CommitId::parse`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId(String);

impl CommitId {
    /// Derive an id from a local wall-clock time.
    pub fn from_datetime(time: &NaiveDateTime) -> Self {
        let micros = (time.nanosecond() / 1_000).min(999_999);
        Self(format!("{}{:06}", time.format(SECONDS_FORMAT), micros))
    }

    /// Parse and validate a user-supplied id.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        let well_formed = (s.len() == ID_LEN || s.len() == LEGACY_LEN)
            && s.bytes().all(|b| b.is_ascii_digit());
        if !well_formed {
            return Err(TypeError::InvalidCommitId(s.to_string()));
        }
        let id = Self(s.to_string());
        id.timestamp()?;
        Ok(id)
    }

    /// Generate the id for a new commit.
    ///
    /// Returns the id for `now` unless that would not sort strictly after
    /// `newest` (same microsecond, or a clock that stepped backwards), in
    /// which case the newest id is advanced by one microsecond.
    pub fn next_after(now: &NaiveDateTime, newest: Option<&CommitId>) -> Result<Self, TypeError> {
        let candidate = Self::from_datetime(now);
        match newest {
            Some(newest) if *newest >= candidate => newest.successor(),
            _ => Ok(candidate),
        }
    }

    /// The id one microsecond after this one.
    pub fn successor(&self) -> Result<Self, TypeError> {
        let next = self
            .timestamp()?
            .checked_add_signed(Duration::microseconds(1))
            .ok_or_else(|| TypeError::CommitIdOverflow(self.0.clone()))?;
        let id = Self::from_datetime(&next);
        if id.0.len() != ID_LEN {
            return Err(TypeError::CommitIdOverflow(self.0.clone()));
        }
        Ok(id)
    }

    /// Decode the wall-clock time encoded in the id.
    pub fn timestamp(&self) -> Result<NaiveDateTime, TypeError> {
        let s = self.0.as_str();
        let invalid = || TypeError::InvalidCommitId(s.to_string());
        if s.len() < LEGACY_LEN || !s.is_char_boundary(LEGACY_LEN) {
            return Err(invalid());
        }
        let field = |from: usize, to: usize| -> Result<u32, TypeError> {
            s.get(from..to)
                .and_then(|part| part.parse::<u32>().ok())
                .ok_or_else(invalid)
        };

        let micros = match s.len() {
            ID_LEN => field(14, 20)?,
            LEGACY_LEN => 0,
            _ => return Err(invalid()),
        };

        NaiveDate::from_ymd_opt(field(0, 4)? as i32, field(4, 6)?, field(6, 8)?)
            .and_then(|date| {
                date.and_hms_micro_opt(field(8, 10).ok()?, field(10, 12).ok()?, field(12, 14).ok()?, micros)
            })
            .ok_or_else(invalid)
    }

    /// Returns `true` for second-resolution ids written by older versions.
    pub fn is_legacy(&self) -> bool {
        self.0.len() == LEGACY_LEN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitId({})", self.0)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CommitId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CommitId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> Self {
        id.0
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A committed file: repo-relative path plus the digest recorded at commit time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Repo-relative, `/`-separated path.
    pub file_name: String,
    /// Content digest at commit time.
    pub hash: Digest,
}

impl FileRecord {
    pub fn new(file_name: impl Into<String>, hash: Digest) -> Self {
        Self {
            file_name: file_name.into(),
            hash,
        }
    }
}

/// One immutable entry of the commit log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub commit_id: CommitId,
    pub message: String,
    /// Files in staging order.
    pub files: Vec<FileRecord>,
    /// Local time formatted with [`TIMESTAMP_FORMAT`].
    pub timestamp: String,
}

impl Commit {
    pub fn new(
        commit_id: CommitId,
        message: impl Into<String>,
        files: Vec<FileRecord>,
        time: &NaiveDateTime,
    ) -> Self {
        Self {
            commit_id,
            message: message.into(),
            files,
            timestamp: time.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Digest recorded for `path`, if the commit contains it.
    pub fn digest_of(&self, path: &str) -> Option<&Digest> {
        self.files
            .iter()
            .find(|f| f.file_name == path)
            .map(|f| &f.hash)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.digest_of(path).is_some()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.file_name.as_str())
    }
}
