use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error};

use crate::{
    core::collapse::collapse_text_mutations,
    mutation::{CollapsedMutation, TextMutation},
    persist::{LogError, MutationLog},
    types::{RecordedAction, TextKey},
};

use super::events::RecorderEvent;

/// Errors returned by [`RecorderHandle`].
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The log store failed on a read or clear.
    #[error(transparent)]
    Log(#[from] LogError),
    /// The recorder task has stopped.
    #[error("recorder task is no longer running")]
    ChannelClosed,
}

/// Recorder task settings.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Pending commands before callers wait.
    pub command_queue_bound: usize,
    /// Events buffered per subscriber.
    pub event_capacity: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 64,
            event_capacity: 256,
        }
    }
}

/// Cloneable handle to the single task that owns a [`MutationLog`].
#[derive(Clone)]
pub struct RecorderHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<RecorderEvent>,
}

enum Command {
    Record {
        action: RecordedAction,
        key: TextKey,
        resp: oneshot::Sender<bool>,
    },
    ReadAll {
        resp: oneshot::Sender<Result<Vec<TextMutation>, RecorderError>>,
    },
    Collapse {
        resp: oneshot::Sender<Result<Vec<CollapsedMutation>, RecorderError>>,
    },
    Clear {
        resp: oneshot::Sender<Result<(), RecorderError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Moves `log` into a new task and returns its handle.
///
/// Must be called from within a tokio runtime.
pub fn spawn_recorder(log: Box<dyn MutationLog>, config: RecorderConfig) -> RecorderHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<RecorderEvent>(config.event_capacity.max(1));

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut log = log;
        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &mut *log, &events_tx_loop) {
                break;
            }
        }
        debug!("recorder task stopped");
    });

    RecorderHandle { cmd_tx, events_tx }
}

impl RecorderHandle {
    /// Subscribes to recorder events.
    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.events_tx.subscribe()
    }

    /// Appends one mutation stamped with the current time.
    ///
    /// Write failures are reported through events and `tracing` only; the
    /// returned flag tells whether the write landed.
    pub async fn record(
        &self,
        action: RecordedAction,
        key: impl Into<TextKey>,
    ) -> Result<bool, RecorderError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Record {
                action,
                key: key.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RecorderError::ChannelClosed)?;
        rx.await.map_err(|_| RecorderError::ChannelClosed)
    }

    /// Every record currently stored.
    pub async fn read_all(&self) -> Result<Vec<TextMutation>, RecorderError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ReadAll { resp: tx })
            .await
            .map_err(|_| RecorderError::ChannelClosed)?;
        rx.await.map_err(|_| RecorderError::ChannelClosed)?
    }

    /// Reads and collapses the stored log.
    pub async fn collapse(&self) -> Result<Vec<CollapsedMutation>, RecorderError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Collapse { resp: tx })
            .await
            .map_err(|_| RecorderError::ChannelClosed)?;
        rx.await.map_err(|_| RecorderError::ChannelClosed)?
    }

    /// Discards all stored history.
    pub async fn clear(&self) -> Result<(), RecorderError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Clear { resp: tx })
            .await
            .map_err(|_| RecorderError::ChannelClosed)?;
        rx.await.map_err(|_| RecorderError::ChannelClosed)?
    }

    /// Stops the task after all previously queued commands.
    pub async fn shutdown(&self) -> Result<(), RecorderError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RecorderError::ChannelClosed)?;
        rx.await.map_err(|_| RecorderError::ChannelClosed)
    }
}

fn handle_command(
    cmd: Command,
    log: &mut dyn MutationLog,
    events_tx: &broadcast::Sender<RecorderEvent>,
) -> bool {
    match cmd {
        Command::Record { action, key, resp } => {
            let written = match log.append(action, &key) {
                Ok(()) => {
                    let _ = events_tx.send(RecorderEvent::Recorded {
                        action,
                        key: key.clone(),
                    });
                    true
                }
                Err(err) => {
                    error!(%key, error = %err, "failed to write text mutation");
                    let _ = events_tx.send(RecorderEvent::WriteFailed {
                        action,
                        key,
                        reason: err.to_string(),
                    });
                    false
                }
            };
            let _ = resp.send(written);
        }
        Command::ReadAll { resp } => {
            let _ = resp.send(log.read_all().map_err(RecorderError::from));
        }
        Command::Collapse { resp } => {
            let res = log
                .read_all()
                .map(|records| collapse_text_mutations(&records))
                .map_err(RecorderError::from);
            let _ = resp.send(res);
        }
        Command::Clear { resp } => {
            let res = log.clear().map_err(RecorderError::from);
            if res.is_ok() {
                let _ = events_tx.send(RecorderEvent::Cleared);
            }
            let _ = resp.send(res);
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }
    false
}
