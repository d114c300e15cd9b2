//! Injectable mutation log stores.

/// CSV file store, the canonical on-disk format.
pub mod csv_file;
/// In-memory store for tests and embedding.
pub mod memory;
/// SQLite journal store.
pub mod sqlite;

use thiserror::Error;
use tracing::error;

use crate::{
    mutation::TextMutation,
    types::{RecordedAction, TextKey},
};

/// Errors raised by mutation log stores.
#[derive(Debug, Error)]
pub enum LogError {
    /// Underlying file could not be read or written.
    #[error("mutation log io error: {0}")]
    Io(#[from] std::io::Error),
    /// CSV reader or writer failure.
    #[error("mutation log csv error: {0}")]
    Csv(#[from] csv::Error),
    /// SQLite failure.
    #[error("mutation log sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Stored data does not match the `timestamp,action,key` schema.
    #[error("mutation log format error: {0}")]
    Format(String),
}

/// Result alias for log store operations.
pub type LogResult<T> = Result<T, LogError>;

/// Append-only store of [`TextMutation`] records.
pub trait MutationLog: Send {
    /// Writes one record verbatim.
    fn append_record(&mut self, mutation: &TextMutation) -> LogResult<()>;

    /// Returns every stored record in log order.
    fn read_all(&self) -> LogResult<Vec<TextMutation>>;

    /// Discards all history. Irreversible.
    fn clear(&mut self) -> LogResult<()>;

    /// Writes one record stamped with the current time.
    fn append(&mut self, action: RecordedAction, key: &str) -> LogResult<()> {
        self.append_record(&TextMutation::now(action, key))
    }
}

impl<L: MutationLog + ?Sized> MutationLog for Box<L> {
    fn append_record(&mut self, mutation: &TextMutation) -> LogResult<()> {
        (**self).append_record(mutation)
    }

    fn read_all(&self) -> LogResult<Vec<TextMutation>> {
        (**self).read_all()
    }

    fn clear(&mut self) -> LogResult<()> {
        (**self).clear()
    }
}

/// Records a mutation without ever failing the caller.
///
/// Returns `false` when the write failed; the failure is reported through
/// `tracing` only.
pub fn record_text_mutation<L: MutationLog + ?Sized>(
    log: &mut L,
    action: RecordedAction,
    key: impl Into<TextKey>,
) -> bool {
    let key = key.into();
    match log.append(action, &key) {
        Ok(()) => true,
        Err(err) => {
            error!(action = action_name(action), %key, error = %err, "failed to write text mutation");
            false
        }
    }
}

/// Clears the log without ever failing the caller.
pub fn reset_text_mutations<L: MutationLog + ?Sized>(log: &mut L) -> bool {
    match log.clear() {
        Ok(()) => true,
        Err(err) => {
            error!(error = %err, "failed to clear mutation log");
            false
        }
    }
}

fn action_name(action: RecordedAction) -> &'static str {
    crate::types::Action::from(action).as_str()
}
