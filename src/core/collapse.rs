use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    mutation::{CollapsedMutation, TextMutation},
    types::{Action, TextKey, Timestamp},
};

#[derive(Debug)]
struct KeyState {
    key: TextKey,
    weight: i32,
    first_action: Action,
    last_timestamp: Timestamp,
}

/// Reduces a mutation log to one net action per key.
///
/// Records are stably sorted by timestamp. Each key keeps a running weight
/// (`add = +1`, `delete = -1`, `noop = 0`) clamped below at `-1`, so one add
/// always cancels any number of earlier deletes. A key whose weight ends at
/// zero is deleted when its first action was an add (created, then removed)
/// and left as `noop` otherwise (removed, then recreated).
///
/// Output follows the order in which keys first appear in the sorted log.
pub fn collapse_text_mutations(mutations: &[TextMutation]) -> Vec<CollapsedMutation> {
    let mut sorted: Vec<&TextMutation> = mutations.iter().collect();
    sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut states: Vec<KeyState> = Vec::new();

    for mutation in sorted {
        let action = mutation.action.normalized();
        let slot = *index.entry(mutation.key.as_str()).or_insert_with(|| {
            states.push(KeyState {
                key: mutation.key.clone(),
                weight: 0,
                first_action: action,
                last_timestamp: mutation.timestamp.clone(),
            });
            states.len() - 1
        });

        let state = &mut states[slot];
        state.weight = (state.weight + action.weight()).max(-1);
        state.last_timestamp.clone_from(&mutation.timestamp);
    }

    states
        .into_iter()
        .map(|state| CollapsedMutation {
            action: resolve_action(state.weight, state.first_action),
            key: state.key,
            timestamp: state.last_timestamp,
        })
        .collect()
}

fn resolve_action(weight: i32, first_action: Action) -> Action {
    if weight > 0 {
        Action::Add
    } else if weight < 0 || first_action == Action::Add {
        Action::Delete
    } else {
        Action::Noop
    }
}

/// Collapsed mutations split by the sync step that consumes them.
///
/// Additions are synced while work is still in progress; deletions are
/// applied by a separate step once the change has shipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    /// Keys to create downstream.
    pub additions: Vec<CollapsedMutation>,
    /// Keys to remove downstream.
    pub deletions: Vec<CollapsedMutation>,
}

impl SyncPlan {
    /// Splits collapsed output, dropping `noop` entries.
    pub fn from_collapsed(collapsed: Vec<CollapsedMutation>) -> Self {
        let mut plan = Self::default();
        for mutation in collapsed {
            match mutation.action {
                Action::Add | Action::AddViaMove => plan.additions.push(mutation),
                Action::Delete => plan.deletions.push(mutation),
                Action::Noop => {}
            }
        }
        plan
    }

    /// Collapses `mutations` and splits the result.
    pub fn from_log(mutations: &[TextMutation]) -> Self {
        Self::from_collapsed(collapse_text_mutations(mutations))
    }

    /// True when neither step has work.
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }
}
