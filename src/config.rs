//! Tool configuration.

use std::path::PathBuf;

use crate::{
    core::{
        diff::{SnapshotDiff, diff_snapshots_with},
        keys::{KeyIdPair, KeyResult, Snapshot},
    },
    migrate::{DEFAULT_CHUNK_SIZE, LokalizeDocument, MigrationPlan, plan_migration},
    persist::csv_file::CsvMutationLog,
    runtime::handle::RecorderConfig,
    types::ID_DELIMITER,
};

/// Settings shared by the lokalize tooling.
#[derive(Debug, Clone)]
pub struct LokalizeConfig {
    /// CSV mutation log location.
    pub mutations_log_path: PathBuf,
    /// Separator between text key and id in snapshot keys.
    pub id_delimiter: String,
    /// Documents per transaction when reconciling ids.
    pub migration_chunk_size: usize,
    /// Recorder task settings.
    pub recorder: RecorderConfig,
}

impl Default for LokalizeConfig {
    fn default() -> Self {
        Self {
            mutations_log_path: PathBuf::from("key-mutations.csv"),
            id_delimiter: ID_DELIMITER.to_string(),
            migration_chunk_size: DEFAULT_CHUNK_SIZE,
            recorder: RecorderConfig::default(),
        }
    }
}

impl LokalizeConfig {
    /// CSV log at [`Self::mutations_log_path`].
    pub fn open_log(&self) -> CsvMutationLog {
        CsvMutationLog::open(&self.mutations_log_path)
    }

    /// Splits a raw snapshot key on [`Self::id_delimiter`].
    pub fn parse_key(&self, raw: &str) -> KeyResult<KeyIdPair> {
        KeyIdPair::parse_with(raw, &self.id_delimiter)
    }

    /// Diffs two snapshots whose keys use [`Self::id_delimiter`].
    pub fn diff(&self, old: &Snapshot, new: &Snapshot) -> KeyResult<SnapshotDiff> {
        diff_snapshots_with(old, new, &self.id_delimiter)
    }

    /// Plans id migration in batches of [`Self::migration_chunk_size`].
    pub fn plan_migration(
        &self,
        dev_published: &[LokalizeDocument],
        prd_published: &[LokalizeDocument],
    ) -> MigrationPlan {
        plan_migration(dev_published, prd_published, self.migration_chunk_size)
    }
}
