//! Document id reconciliation between two CMS datasets.
//!
//! Both datasets hold one document per text key but were created with
//! independent ids. Moving texts is detected by id, so the development
//! documents are replaced by their production counterparts, keyed by text
//! key, to make the ids match.

use async_trait::async_trait;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{references::SourceError, types::TextKey};

/// Default number of documents per committed transaction.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// A lokalize text document as stored in the CMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LokalizeDocument {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Dotted text key.
    pub key: TextKey,
    /// Every other field, carried over untouched.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Errors raised while reconciling document ids.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// No development document carries this key.
    #[error("no document id matched for key {key}")]
    UnmatchedKey {
        /// Production key without a development counterpart.
        key: TextKey,
    },
    /// The dataset rejected a write.
    #[error("{action} failed: {source}")]
    Dataset {
        /// What was being attempted.
        action: String,
        /// Underlying failure.
        source: SourceError,
    },
}

/// Result alias for id migration.
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Delete the development document, then write the production one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceStep {
    /// Development document to delete.
    pub delete_id: String,
    /// Production document to create or replace.
    pub replacement: LokalizeDocument,
}

/// Steps grouped per transaction, plus per-item failures.
#[derive(Debug, Default)]
pub struct MigrationPlan {
    /// Non-empty batches, in production document order.
    pub batches: Vec<Vec<ReplaceStep>>,
    /// Production documents that could not be matched.
    pub failures: Vec<MigrateError>,
}

impl MigrationPlan {
    /// Total number of replace steps across batches.
    pub fn step_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }
}

/// Matches every production document to a development id by key.
///
/// Production documents are chunked by `chunk_size` first; unmatched keys
/// are reported in [`MigrationPlan::failures`] without affecting the rest of
/// their chunk. When several development documents share a key the last one
/// wins.
pub fn plan_migration(
    dev_published: &[LokalizeDocument],
    prd_published: &[LokalizeDocument],
    chunk_size: usize,
) -> MigrationPlan {
    let dev_id_by_key: HashMap<&str, &str> = dev_published
        .iter()
        .map(|doc| (doc.key.as_str(), doc.id.as_str()))
        .collect();

    let mut plan = MigrationPlan::default();
    for chunk in prd_published.chunks(chunk_size.max(1)) {
        let mut batch = Vec::with_capacity(chunk.len());
        for doc in chunk {
            match dev_id_by_key.get(doc.key.as_str()) {
                Some(dev_id) => batch.push(ReplaceStep {
                    delete_id: (*dev_id).to_string(),
                    replacement: doc.clone(),
                }),
                None => {
                    let err = MigrateError::UnmatchedKey {
                        key: doc.key.clone(),
                    };
                    warn!(error = %err, "failed to process document");
                    plan.failures.push(err);
                }
            }
        }
        if !batch.is_empty() {
            plan.batches.push(batch);
        }
    }
    plan
}

/// Write access to the target dataset.
#[async_trait]
pub trait LokalizeDataset: Send + Sync {
    /// Deletes one document.
    async fn delete_document(&self, id: &str) -> Result<(), SourceError>;

    /// Applies all steps of one batch atomically.
    async fn commit_replacements(&self, steps: &[ReplaceStep]) -> Result<(), SourceError>;
}

/// Outcome of [`apply_migration`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Drafts removed before replacing.
    pub drafts_deleted: usize,
    /// Transactions committed.
    pub batches_committed: usize,
    /// Documents replaced.
    pub documents_replaced: usize,
    /// Production documents skipped during planning.
    pub documents_skipped: usize,
}

/// Deletes development drafts, then commits every batch of `plan`.
///
/// Drafts go first so none is left dangling once its published counterpart
/// is replaced. Any dataset failure aborts the run.
pub async fn apply_migration<D: LokalizeDataset + ?Sized>(
    dataset: &D,
    dev_drafts: &[LokalizeDocument],
    plan: &MigrationPlan,
) -> MigrateResult<MigrationReport> {
    let mut report = MigrationReport {
        documents_skipped: plan.failures.len(),
        ..MigrationReport::default()
    };

    for draft in dev_drafts {
        debug!(id = %draft.id, "deleting draft");
        dataset
            .delete_document(&draft.id)
            .await
            .map_err(|source| MigrateError::Dataset {
                action: format!("deleting draft {}", draft.id),
                source,
            })?;
        report.drafts_deleted += 1;
    }

    info!(batches = plan.batches.len(), "committing replacement batches");
    for (idx, batch) in plan.batches.iter().enumerate() {
        info!(batch = idx, documents = batch.len(), "committing transaction");
        dataset
            .commit_replacements(batch)
            .await
            .map_err(|source| MigrateError::Dataset {
                action: format!("committing batch {idx}"),
                source,
            })?;
        report.batches_committed += 1;
        report.documents_replaced += batch.len();
    }

    Ok(report)
}
