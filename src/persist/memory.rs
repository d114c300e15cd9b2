//! In-memory mutation log.

use crate::mutation::TextMutation;

use super::{LogResult, MutationLog};

/// Mutation log held in a `Vec`; never fails.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMutationLog {
    records: Vec<TextMutation>,
}

impl InMemoryMutationLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log pre-filled with `records`, in order.
    pub fn with_records(records: Vec<TextMutation>) -> Self {
        Self { records }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MutationLog for InMemoryMutationLog {
    fn append_record(&mut self, mutation: &TextMutation) -> LogResult<()> {
        self.records.push(mutation.clone());
        Ok(())
    }

    fn read_all(&self) -> LogResult<Vec<TextMutation>> {
        Ok(self.records.clone())
    }

    fn clear(&mut self) -> LogResult<()> {
        self.records.clear();
        Ok(())
    }
}
