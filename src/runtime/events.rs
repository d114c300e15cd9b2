//! Recorder event stream payloads.

use crate::types::{RecordedAction, TextKey};

/// Events emitted from the recorder task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// A mutation was written.
    Recorded {
        /// Recorded action.
        action: RecordedAction,
        /// Affected key.
        key: TextKey,
    },
    /// A mutation could not be written and was dropped.
    WriteFailed {
        /// Attempted action.
        action: RecordedAction,
        /// Affected key.
        key: TextKey,
        /// Store error text.
        reason: String,
    },
    /// The log was cleared.
    Cleared,
}
