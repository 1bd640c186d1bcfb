use mama_types::Commit;

/// Result of [`Repository::init`](crate::Repository::init).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    AlreadyInitialized,
}

/// What an `add` did, per path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddReport {
    /// Paths newly staged, in walk order.
    pub staged: Vec<String>,
    /// Paths whose content matched the tracked digest.
    pub unchanged: Vec<String>,
    /// Paths skipped by the exclusion rules (explicit `add` only).
    pub excluded: Vec<String>,
    /// Paths that could not be staged. The rest of the batch still ran.
    pub failures: Vec<AddFailure>,
}

impl AddReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another report into this one.
    pub fn absorb(&mut self, other: AddReport) {
        self.staged.extend(other.staged);
        self.unchanged.extend(other.unchanged);
        self.excluded.extend(other.excluded);
        self.failures.extend(other.failures);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddFailure {
    pub path: String,
    pub reason: String,
}

/// Result of [`Repository::commit`](crate::Repository::commit).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed(CommitSummary),
    /// Staging was empty; nothing was written.
    NothingToCommit,
}

impl CommitOutcome {
    pub fn summary(&self) -> Option<&CommitSummary> {
        match self {
            Self::Committed(summary) => Some(summary),
            Self::NothingToCommit => None,
        }
    }
}

/// A successful commit and how its files relate to earlier history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitSummary {
    pub commit: Commit,
    /// Paths no earlier commit contained.
    pub new_files: Vec<String>,
    /// Paths an earlier commit contained.
    pub modified_files: Vec<String>,
}
