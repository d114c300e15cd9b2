//! Shared primitive aliases and the mutation action enums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dotted path identifying one localized text, e.g. `common.nav.title`.
pub type TextKey = String;
/// Stable per-text document identifier.
pub type TextId = String;
/// ISO-8601 UTC timestamp with millisecond precision.
///
/// Only ever compared lexicographically, which matches chronological order
/// for this fixed-width format.
pub type Timestamp = String;

/// Reserved substring separating a text key from its stable id.
pub const ID_DELIMITER: &str = "__@__";

/// Any action that can appear in a mutation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Key was created.
    Add,
    /// Key was scheduled for removal.
    Delete,
    /// Net result of churn that leaves the key untouched.
    Noop,
    /// Key was created as the target of a move.
    AddViaMove,
}

impl Action {
    /// All actions accepted when reading a log.
    pub const ALL: [Action; 4] = [Action::Add, Action::Delete, Action::Noop, Action::AddViaMove];

    /// Folds `AddViaMove` into `Add`; every other action is unchanged.
    pub fn normalized(self) -> Self {
        match self {
            Action::AddViaMove => Action::Add,
            other => other,
        }
    }

    /// Contribution of this action to a key's running weight.
    pub fn weight(self) -> i32 {
        match self.normalized() {
            Action::Add | Action::AddViaMove => 1,
            Action::Delete => -1,
            Action::Noop => 0,
        }
    }

    /// Log representation of the action.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Delete => "delete",
            Action::Noop => "noop",
            Action::AddViaMove => "add_via_move",
        }
    }

    /// Parses the log representation; `None` for anything outside the set.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == value)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions that callers may write to a log directly.
///
/// `noop` and `add_via_move` only arise while collapsing or from tooling
/// that writes records verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordedAction {
    /// Key was created.
    Add,
    /// Key was scheduled for removal.
    Delete,
}

impl From<RecordedAction> for Action {
    fn from(value: RecordedAction) -> Self {
        match value {
            RecordedAction::Add => Action::Add,
            RecordedAction::Delete => Action::Delete,
        }
    }
}
