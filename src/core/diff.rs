use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{ID_DELIMITER, TextId, TextKey};

use super::keys::{KeyIdPair, KeyResult, Snapshot};

/// A key present only in the new snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedText {
    /// New text key.
    pub key: TextKey,
    /// Text under the new key.
    pub text: String,
}

/// A key whose id survived under a different key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovedText {
    /// Key in the new snapshot.
    pub key: TextKey,
    /// Key in the old snapshot.
    pub old_key: TextKey,
    /// Text under the new key.
    pub text: String,
    /// Shared stable id.
    pub id: TextId,
}

/// An id that no longer exists in the new snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedText {
    /// Key in the old snapshot.
    pub key: TextKey,
    /// Removed id.
    pub id: TextId,
}

/// Classification of every raw key that differs between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    /// Keys only in the new snapshot with no matching removed id.
    pub add: Vec<AddedText>,
    /// Keys renamed while keeping their id.
    #[serde(rename = "move")]
    pub moved: Vec<MovedText>,
    /// Ids only in the old snapshot.
    pub delete: Vec<DeletedText>,
}

impl SnapshotDiff {
    /// True when the snapshots hold the same raw keys.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.moved.is_empty() && self.delete.is_empty()
    }
}

/// Diffs two snapshots whose keys use [`ID_DELIMITER`].
pub fn diff_snapshots(old: &Snapshot, new: &Snapshot) -> KeyResult<SnapshotDiff> {
    diff_snapshots_with(old, new, ID_DELIMITER)
}

/// Diffs two snapshots, splitting raw keys on `delimiter`.
///
/// Keys are compared by full raw key. A removed and an added key that share
/// an id become a move; the first pending removal with that id wins, so a
/// duplicated id never matches twice. Every raw key of both snapshots must
/// parse, otherwise the whole diff fails.
pub fn diff_snapshots_with(
    old: &Snapshot,
    new: &Snapshot,
    delimiter: &str,
) -> KeyResult<SnapshotDiff> {
    for (raw, _) in old.iter().chain(new.iter()) {
        KeyIdPair::parse_with(raw, delimiter)?;
    }

    let mut pending_deletes: Vec<KeyIdPair> = old
        .iter()
        .filter(|(raw, _)| !new.contains(raw))
        .map(|(raw, _)| KeyIdPair::parse_with(raw, delimiter))
        .collect::<KeyResult<_>>()?;

    let mut diff = SnapshotDiff::default();

    for (raw, text) in new.iter().filter(|(raw, _)| !old.contains(raw)) {
        let added = KeyIdPair::parse_with(raw, delimiter)?;

        match pending_deletes.iter().position(|d| d.id == added.id) {
            Some(pos) => {
                let removed = pending_deletes.remove(pos);
                debug!(old_key = %removed.key, new_key = %added.key, id = %added.id, "text moved");
                diff.moved.push(MovedText {
                    key: added.key,
                    old_key: removed.key,
                    text: text.to_string(),
                    id: added.id,
                });
            }
            None => diff.add.push(AddedText {
                key: added.key,
                text: text.to_string(),
            }),
        }
    }

    diff.delete = pending_deletes
        .into_iter()
        .map(|KeyIdPair { key, id }| DeletedText { key, id })
        .collect();

    Ok(diff)
}
