use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::commit::{CommitId, TIMESTAMP_FORMAT};

/// Contents of `rollback.json`: which commit the last rollback targeted, and when.
///
/// Overwritten on every rollback. Informational only; nothing reads it back
/// to drive behavior.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackMarker {
    pub rollback_to: CommitId,
    pub timestamp: String,
}

impl RollbackMarker {
    pub fn new(rollback_to: CommitId, time: &NaiveDateTime) -> Self {
        Self {
            rollback_to,
            timestamp: time.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_json_shape() {
        let time = NaiveDateTime::parse_from_str("2024-10-25 17:00:01", "%Y-%m-%d %H:%M:%S").unwrap();
        let marker = RollbackMarker::new(CommitId::parse("20241025163308").unwrap(), &time);
        let value = serde_json::to_value(&marker).unwrap();
        assert_eq!(value["rollback_to"], "20241025163308");
        assert_eq!(value["timestamp"], "2024-10-25 17:00:01");
    }
}
