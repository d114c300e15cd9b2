use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use lokalize::{
    config::LokalizeConfig,
    migrate::{
        LokalizeDataset, LokalizeDocument, MigrateError, ReplaceStep, apply_migration,
        plan_migration,
    },
    references::SourceError,
};

fn doc(id: &str, key: &str) -> LokalizeDocument {
    serde_json::from_value(json!({ "_id": id, "key": key, "text": { "nl": key } }))
        .expect("document")
}

#[derive(Default)]
struct RecordingDataset {
    deleted: Mutex<Vec<String>>,
    committed: Mutex<Vec<Vec<ReplaceStep>>>,
    fail_commits: bool,
}

#[async_trait]
impl LokalizeDataset for RecordingDataset {
    async fn delete_document(&self, id: &str) -> Result<(), SourceError> {
        self.deleted.lock().expect("lock").push(id.to_string());
        Ok(())
    }

    async fn commit_replacements(&self, steps: &[ReplaceStep]) -> Result<(), SourceError> {
        if self.fail_commits {
            return Err("transaction rejected".into());
        }
        self.committed.lock().expect("lock").push(steps.to_vec());
        Ok(())
    }
}

#[test]
fn unmatched_keys_are_reported_and_the_rest_still_planned() {
    let dev = vec![doc("dev-1", "a"), doc("dev-2", "b")];
    let prd = vec![doc("prd-1", "a"), doc("prd-9", "missing"), doc("prd-2", "b")];

    let plan = plan_migration(&dev, &prd, 500);
    assert_eq!(plan.batches.len(), 1);
    assert_eq!(plan.step_count(), 2);
    assert_eq!(plan.batches[0][0].delete_id, "dev-1");
    assert_eq!(plan.batches[0][0].replacement.id, "prd-1");
    assert_eq!(plan.batches[0][1].delete_id, "dev-2");

    assert_eq!(plan.failures.len(), 1);
    assert!(matches!(
        &plan.failures[0],
        MigrateError::UnmatchedKey { key } if key == "missing"
    ));
}

#[test]
fn production_documents_are_chunked() {
    let dev: Vec<_> = (0..5).map(|i| doc(&format!("dev-{i}"), &format!("k{i}"))).collect();
    let prd: Vec<_> = (0..5).map(|i| doc(&format!("prd-{i}"), &format!("k{i}"))).collect();

    let plan = plan_migration(&dev, &prd, 2);
    let sizes: Vec<_> = plan.batches.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 2, 1]);

    // A zero chunk size still makes progress.
    assert_eq!(plan_migration(&dev, &prd, 0).batches.len(), 5);
}

#[test]
fn configured_chunk_size_sets_batch_size() {
    let dev: Vec<_> = (0..7).map(|i| doc(&format!("dev-{i}"), &format!("k{i}"))).collect();
    let prd: Vec<_> = (0..7).map(|i| doc(&format!("prd-{i}"), &format!("k{i}"))).collect();

    let config = LokalizeConfig {
        migration_chunk_size: 3,
        ..LokalizeConfig::default()
    };
    let sizes: Vec<_> = config
        .plan_migration(&dev, &prd)
        .batches
        .iter()
        .map(Vec::len)
        .collect();
    assert_eq!(sizes, vec![3, 3, 1]);

    assert_eq!(LokalizeConfig::default().plan_migration(&dev, &prd).batches.len(), 1);
}

#[test]
fn extra_fields_survive_serialization() {
    let d = doc("prd-1", "a.b");
    let value = serde_json::to_value(&d).expect("serialize");
    assert_eq!(value["_id"], "prd-1");
    assert_eq!(value["text"]["nl"], "a.b");
}

#[tokio::test]
async fn apply_deletes_drafts_then_commits_batches() {
    let dev = vec![doc("dev-1", "a"), doc("dev-2", "b")];
    let prd = vec![doc("prd-1", "a"), doc("prd-2", "b"), doc("prd-3", "c")];
    let drafts = vec![doc("drafts.dev-1", "a")];

    let plan = plan_migration(&dev, &prd, 1);
    let dataset = RecordingDataset::default();
    let report = apply_migration(&dataset, &drafts, &plan).await.expect("apply");

    assert_eq!(report.drafts_deleted, 1);
    assert_eq!(report.batches_committed, 2);
    assert_eq!(report.documents_replaced, 2);
    assert_eq!(report.documents_skipped, 1);
    assert_eq!(*dataset.deleted.lock().expect("lock"), vec!["drafts.dev-1"]);
    assert_eq!(dataset.committed.lock().expect("lock").len(), 2);
}

#[tokio::test]
async fn commit_failure_aborts_the_run() {
    let dev = vec![doc("dev-1", "a")];
    let prd = vec![doc("prd-1", "a")];
    let plan = plan_migration(&dev, &prd, 10);

    let dataset = RecordingDataset {
        fail_commits: true,
        ..RecordingDataset::default()
    };
    let err = apply_migration(&dataset, &[], &plan).await.unwrap_err();
    assert!(matches!(err, MigrateError::Dataset { .. }));
    assert!(err.to_string().contains("transaction rejected"));
}
