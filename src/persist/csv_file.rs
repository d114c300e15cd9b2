//! CSV file mutation log (`timestamp,action,key`).

use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, Terminator, WriterBuilder};

use crate::{
    mutation::{LOG_COLUMNS, TextMutation},
    types::Action,
};

use super::{LogError, LogResult, MutationLog};

/// Mutation log backed by a header-first CSV file.
///
/// A missing or zero-length file reads as an empty log. Appending to such a
/// file writes the header first.
#[derive(Debug, Clone)]
pub struct CsvMutationLog {
    path: PathBuf,
}

impl CsvMutationLog {
    /// Uses the file at `path`; nothing is created until the first write.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer<W: io::Write>(inner: W) -> csv::Writer<W> {
        WriterBuilder::new()
            .has_headers(false)
            .terminator(platform_terminator())
            .from_writer(inner)
    }
}

impl MutationLog for CsvMutationLog {
    fn append_record(&mut self, mutation: &TextMutation) -> LogResult<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = Self::writer(file);
        if needs_header {
            writer.write_record(LOG_COLUMNS)?;
        }
        writer.write_record([
            mutation.timestamp.as_str(),
            mutation.action.as_str(),
            mutation.key.as_str(),
        ])?;
        writer.flush()?;
        Ok(())
    }

    fn read_all(&self) -> LogResult<Vec<TextMutation>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if file.metadata()?.len() == 0 {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers = reader.headers()?;
        if headers.iter().ne(LOG_COLUMNS) {
            return Err(LogError::Format(format!(
                "expected header `{}`, found `{}`",
                LOG_COLUMNS.join(","),
                headers.iter().collect::<Vec<_>>().join(",")
            )));
        }

        let mut out = Vec::new();
        for (idx, row) in reader.records().enumerate() {
            let row = row?;
            // Header is line 1.
            let line = idx + 2;
            if row.len() != LOG_COLUMNS.len() {
                return Err(LogError::Format(format!(
                    "line {line}: expected 3 fields, found {}",
                    row.len()
                )));
            }
            let (timestamp, action, key) = (&row[0], &row[1], &row[2]);
            let action = Action::parse(action).ok_or_else(|| {
                LogError::Format(format!("line {line}: unknown action `{action}`"))
            })?;
            out.push(TextMutation::new(timestamp, action, key));
        }
        Ok(out)
    }

    fn clear(&mut self) -> LogResult<()> {
        let mut writer = Self::writer(Vec::new());
        writer.write_record(LOG_COLUMNS)?;
        let bytes = writer
            .into_inner()
            .map_err(|e| LogError::Io(io::Error::other(e.to_string())))?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

fn platform_terminator() -> Terminator {
    if cfg!(windows) {
        Terminator::CRLF
    } else {
        Terminator::Any(b'\n')
    }
}
