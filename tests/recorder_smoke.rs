use tempfile::TempDir;

use lokalize::{
    mutation::TextMutation,
    persist::{LogError, LogResult, MutationLog, csv_file::CsvMutationLog, memory::InMemoryMutationLog},
    runtime::{
        events::RecorderEvent,
        handle::{RecorderConfig, RecorderError, spawn_recorder},
    },
    types::{Action, RecordedAction},
};

struct FailingLog;

impl MutationLog for FailingLog {
    fn append_record(&mut self, _mutation: &TextMutation) -> LogResult<()> {
        Err(LogError::Format("read-only".to_string()))
    }

    fn read_all(&self) -> LogResult<Vec<TextMutation>> {
        Err(LogError::Format("unreadable".to_string()))
    }

    fn clear(&mut self) -> LogResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn records_from_many_tasks_are_all_kept() {
    let handle = spawn_recorder(Box::new(InMemoryMutationLog::new()), RecorderConfig::default());

    let mut tasks = Vec::new();
    for i in 0..16 {
        let h = handle.clone();
        tasks.push(tokio::spawn(async move {
            h.record(RecordedAction::Add, format!("key.{i}")).await
        }));
    }
    for t in tasks {
        assert!(t.await.expect("join").expect("record"));
    }

    let records = handle.read_all().await.expect("read_all");
    assert_eq!(records.len(), 16);
    assert!(records.iter().all(|r| r.action == Action::Add));

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn events_and_collapse_follow_the_log() {
    let tmp = TempDir::new().expect("tmp");
    let log = CsvMutationLog::open(tmp.path().join("log.csv"));
    let handle = spawn_recorder(Box::new(log), RecorderConfig::default());
    let mut events = handle.subscribe();

    handle.clear().await.expect("clear");
    assert_eq!(events.recv().await.expect("event"), RecorderEvent::Cleared);

    assert!(handle.record(RecordedAction::Add, "a").await.expect("record"));
    assert_eq!(
        events.recv().await.expect("event"),
        RecorderEvent::Recorded {
            action: RecordedAction::Add,
            key: "a".to_string()
        }
    );

    let collapsed = handle.collapse().await.expect("collapse");
    assert_eq!(collapsed.len(), 1);
    assert_eq!(collapsed[0].action, Action::Add);

    handle.shutdown().await.expect("shutdown");
    assert!(matches!(
        handle.read_all().await,
        Err(RecorderError::ChannelClosed)
    ));
}

#[tokio::test]
async fn write_failures_do_not_fail_the_caller() {
    let handle = spawn_recorder(Box::new(FailingLog), RecorderConfig::default());
    let mut events = handle.subscribe();

    let written = handle.record(RecordedAction::Delete, "a").await.expect("record");
    assert!(!written);
    assert!(matches!(
        events.recv().await.expect("event"),
        RecorderEvent::WriteFailed { action: RecordedAction::Delete, .. }
    ));

    // Reads still propagate.
    assert!(matches!(
        handle.read_all().await,
        Err(RecorderError::Log(LogError::Format(_)))
    ));
    handle.shutdown().await.expect("shutdown");
}
