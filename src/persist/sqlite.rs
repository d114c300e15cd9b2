//! SQLite-backed append-only mutation journal.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::{mutation::TextMutation, types::Action};

use super::{LogError, LogResult, MutationLog};

/// SQLite implementation of [`crate::persist::MutationLog`].
///
/// Row id order is log order.
pub struct SqliteMutationLog {
    conn: Connection,
}

impl SqliteMutationLog {
    /// Opens or creates a SQLite-backed log at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> LogResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite log.
    pub fn open_in_memory() -> LogResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> LogResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    /// Number of stored records.
    pub fn len(&self) -> LogResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM mutations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> LogResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Timestamp of the most recent record, if any.
    pub fn latest_timestamp(&self) -> LogResult<Option<String>> {
        let ts: Option<String> = self
            .conn
            .query_row(
                "SELECT ts FROM mutations ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(ts)
    }

    /// Writes several records in one transaction.
    pub fn append_records(&mut self, mutations: &[TextMutation]) -> LogResult<()> {
        if mutations.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO mutations(ts, action, key) VALUES (?1, ?2, ?3)")?;
            for m in mutations {
                stmt.execute(params![m.timestamp, m.action.as_str(), m.key])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl MutationLog for SqliteMutationLog {
    fn append_record(&mut self, mutation: &TextMutation) -> LogResult<()> {
        self.append_records(std::slice::from_ref(mutation))
    }

    fn read_all(&self) -> LogResult<Vec<TextMutation>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, ts, action, key FROM mutations ORDER BY id ASC")?;

        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let ts: String = row.get(1)?;
            let action: String = row.get(2)?;
            let key: String = row.get(3)?;
            Ok((id, ts, action, key))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, ts, action, key) = row?;
            let action = Action::parse(&action).ok_or_else(|| {
                LogError::Format(format!("row {id}: unknown action `{action}`"))
            })?;
            out.push(TextMutation::new(ts, action, key));
        }
        Ok(out)
    }

    fn clear(&mut self) -> LogResult<()> {
        self.conn.execute("DELETE FROM mutations", [])?;
        Ok(())
    }
}
