use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

use crate::{
    action::{Action, ActionDraft},
    core::{
        journal::{Journal, JournalError},
        status::JournalStatus,
    },
    engine::traits::EntityRepository,
    entity::Snapshot,
    persist::KvStore,
    types::{EntityId, EntityKind},
};

use super::events::JournalEvent;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Journal(#[from] JournalError),
    #[error("journal runtime is not running")]
    ChannelClosed,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command_queue_bound: usize,
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 64,
            event_capacity: 256,
        }
    }
}

/// Cloneable front end to a journal owned by one writer thread.
///
/// Commands are applied strictly in arrival order, so stack mutation and
/// persistence never interleave no matter how many tasks hold a handle.
pub struct JournalHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<JournalEvent>,
}

impl Clone for JournalHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    Push {
        draft: ActionDraft,
        resp: oneshot::Sender<Action>,
    },
    Create {
        kind: EntityKind,
        data: Snapshot,
        resp: oneshot::Sender<Result<Action, JournalError>>,
    },
    Update {
        kind: EntityKind,
        id: EntityId,
        patch: Snapshot,
        resp: oneshot::Sender<Result<Action, JournalError>>,
    },
    Delete {
        kind: EntityKind,
        id: EntityId,
        resp: oneshot::Sender<Result<Action, JournalError>>,
    },
    Undo {
        resp: oneshot::Sender<Result<Option<Action>, JournalError>>,
    },
    Redo {
        resp: oneshot::Sender<Result<Option<Action>, JournalError>>,
    },
    Clear {
        resp: oneshot::Sender<()>,
    },
    Status {
        resp: oneshot::Sender<JournalStatus>,
    },
    Get {
        kind: EntityKind,
        id: EntityId,
        resp: oneshot::Sender<Result<Option<Snapshot>, JournalError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Moves `journal` and `repo` onto a blocking worker and returns its handle.
///
/// Repository and store calls are synchronous, so the loop runs on tokio's
/// blocking pool rather than an async worker. A refresh listener already set
/// on `journal` keeps running, followed by a [`JournalEvent::Refresh`].
pub fn spawn_journal<S, R>(mut journal: Journal<S>, repo: R, config: RuntimeConfig) -> JournalHandle
where
    S: KvStore + 'static,
    R: EntityRepository + Send + 'static,
{
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<JournalEvent>(config.event_capacity.max(1));

    let refresh_tx = events_tx.clone();
    let mut host_listener = journal.take_refresh_listener();
    journal.set_refresh_listener(move || {
        if let Some(listener) = host_listener.as_mut() {
            listener();
        }
        let _ = refresh_tx.send(JournalEvent::Refresh);
    });

    let events_tx_loop = events_tx.clone();
    tokio::task::spawn_blocking(move || {
        let mut repo = repo;
        while let Some(cmd) = cmd_rx.blocking_recv() {
            if handle_command(cmd, &mut journal, &mut repo, &events_tx_loop) {
                break;
            }
        }
        debug!("journal runtime stopped");
    });

    JournalHandle { cmd_tx, events_tx }
}

impl JournalHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<JournalEvent> {
        self.events_tx.subscribe()
    }

    pub async fn push(&self, draft: ActionDraft) -> Result<Action, RuntimeError> {
        self.request(|resp| Command::Push { draft, resp }).await
    }

    pub async fn create(&self, kind: EntityKind, data: Snapshot) -> Result<Action, RuntimeError> {
        Ok(self.request(|resp| Command::Create { kind, data, resp }).await??)
    }

    pub async fn update(
        &self,
        kind: EntityKind,
        id: EntityId,
        patch: Snapshot,
    ) -> Result<Action, RuntimeError> {
        Ok(self
            .request(|resp| Command::Update {
                kind,
                id,
                patch,
                resp,
            })
            .await??)
    }

    pub async fn delete(&self, kind: EntityKind, id: EntityId) -> Result<Action, RuntimeError> {
        Ok(self.request(|resp| Command::Delete { kind, id, resp }).await??)
    }

    pub async fn undo(&self) -> Result<Option<Action>, RuntimeError> {
        Ok(self.request(|resp| Command::Undo { resp }).await??)
    }

    pub async fn redo(&self) -> Result<Option<Action>, RuntimeError> {
        Ok(self.request(|resp| Command::Redo { resp }).await??)
    }

    pub async fn clear(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Clear { resp }).await
    }

    pub async fn status(&self) -> Result<JournalStatus, RuntimeError> {
        self.request(|resp| Command::Status { resp }).await
    }

    pub async fn get(&self, kind: EntityKind, id: EntityId) -> Result<Option<Snapshot>, RuntimeError> {
        Ok(self.request(|resp| Command::Get { kind, id, resp }).await??)
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

fn handle_command<S, R>(
    cmd: Command,
    journal: &mut Journal<S>,
    repo: &mut R,
    events_tx: &broadcast::Sender<JournalEvent>,
) -> bool
where
    S: KvStore,
    R: EntityRepository,
{
    match cmd {
        Command::Push { draft, resp } => {
            let action = journal.push_action(draft);
            let _ = events_tx.send(JournalEvent::Pushed {
                action_id: action.id.clone(),
            });
            let _ = resp.send(action);
        }
        Command::Create { kind, data, resp } => {
            let res = journal.create_tracked(repo, kind, data);
            announce_push(events_tx, &res);
            let _ = resp.send(res);
        }
        Command::Update {
            kind,
            id,
            patch,
            resp,
        } => {
            let res = journal.update_tracked(repo, kind, id, patch);
            announce_push(events_tx, &res);
            let _ = resp.send(res);
        }
        Command::Delete { kind, id, resp } => {
            let res = journal.delete_tracked(repo, kind, id);
            announce_push(events_tx, &res);
            let _ = resp.send(res);
        }
        Command::Undo { resp } => {
            let res = journal.undo(repo);
            match &res {
                Ok(Some(action)) => {
                    let _ = events_tx.send(JournalEvent::Undone {
                        action_id: action.id.clone(),
                    });
                }
                Ok(None) => {}
                Err(err) => {
                    let _ = events_tx.send(JournalEvent::UndoFailed {
                        message: err.to_string(),
                    });
                }
            }
            let _ = resp.send(res);
        }
        Command::Redo { resp } => {
            let res = journal.redo(repo);
            match &res {
                Ok(Some(action)) => {
                    let _ = events_tx.send(JournalEvent::Redone {
                        action_id: action.id.clone(),
                    });
                }
                Ok(None) => {}
                Err(err) => {
                    let _ = events_tx.send(JournalEvent::RedoFailed {
                        message: err.to_string(),
                    });
                }
            }
            let _ = resp.send(res);
        }
        Command::Clear { resp } => {
            journal.clear();
            let _ = events_tx.send(JournalEvent::Cleared);
            let _ = resp.send(());
        }
        Command::Status { resp } => {
            let _ = resp.send(journal.status());
        }
        Command::Get { kind, id, resp } => {
            let _ = resp.send(repo.get_entity(kind, id).map_err(JournalError::from));
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}

fn announce_push(events_tx: &broadcast::Sender<JournalEvent>, res: &Result<Action, JournalError>) {
    if let Ok(action) = res {
        let _ = events_tx.send(JournalEvent::Pushed {
            action_id: action.id.clone(),
        });
    }
}
