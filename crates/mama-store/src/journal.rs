use std::path::PathBuf;

use mama_types::RollbackMarker;

use crate::error::StoreResult;
use crate::persist::{read_json, write_json_atomic};

/// `rollback.json`: the target and time of the most recent rollback.
#[derive(Clone, Debug)]
pub struct RollbackJournal {
    path: PathBuf,
}

impl RollbackJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Overwrite the marker.
    pub fn write(&self, marker: &RollbackMarker) -> StoreResult<()> {
        write_json_atomic(&self.path, marker)
    }

    /// The last marker written, if any.
    pub fn read(&self) -> StoreResult<Option<RollbackMarker>> {
        read_json(&self.path)
    }
}
