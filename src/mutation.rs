//! Mutation record model shared by the log stores and the collapser.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Action, RecordedAction, TextKey, Timestamp};

/// Column names of the mutation log, in their mandatory order.
pub const LOG_COLUMNS: [&str; 3] = ["timestamp", "action", "key"];

/// One row of the mutation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMutation {
    /// When the mutation was recorded.
    pub timestamp: Timestamp,
    /// What happened to the key.
    pub action: Action,
    /// Affected text key.
    pub key: TextKey,
}

impl TextMutation {
    /// Builds a record with an explicit timestamp.
    pub fn new(timestamp: impl Into<Timestamp>, action: Action, key: impl Into<TextKey>) -> Self {
        Self {
            timestamp: timestamp.into(),
            action,
            key: key.into(),
        }
    }

    /// Builds a record stamped with the current wall-clock time.
    pub fn now(action: RecordedAction, key: impl Into<TextKey>) -> Self {
        Self::new(now_iso8601(), action.into(), key)
    }
}

/// Net action for a key after collapsing its history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapsedMutation {
    /// Affected text key.
    pub key: TextKey,
    /// One of `add`, `delete` or `noop`.
    pub action: Action,
    /// Timestamp of the last record seen for the key.
    pub timestamp: Timestamp,
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn now_iso8601() -> Timestamp {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
