use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    action::{Action, ActionDraft},
    config::JournalConfig,
    engine::{
        dispatch::{DispatchError, execute_redo, execute_undo},
        traits::{EntityRepository, RepoError},
    },
    entity::Snapshot,
    persist::{
        KvStore,
        codec::{JournalCodec, LoadedHistory},
    },
    types::{EntityId, EntityKind, TimestampMs, now_ms},
};

use super::status::{Disposition, JournalStatus, LastAction};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JournalError {
    #[error("undo failed: {0}")]
    Undo(DispatchError),
    #[error("redo failed: {0}")]
    Redo(DispatchError),
    #[error(transparent)]
    Repository(#[from] RepoError),
}

/// Operations shared by [`Journal`] and [`super::noop::NoopJournal`].
pub trait UndoHistory {
    /// Records an action; returns it when it was kept.
    fn push_action(&mut self, draft: ActionDraft) -> Option<Action>;
    fn undo(&mut self, repo: &mut dyn EntityRepository) -> Result<Option<Action>, JournalError>;
    fn redo(&mut self, repo: &mut dyn EntityRepository) -> Result<Option<Action>, JournalError>;
    fn clear(&mut self);
    fn status(&self) -> JournalStatus;
}

/// Callback signalled after the backing data changed under the host.
pub type RefreshListener = Box<dyn FnMut() + Send>;

/// Linear undo/redo history with durable persistence.
///
/// The tail of each stack is the most recent entry. A successful undo moves
/// the undo tail onto the redo stack and a redo does the reverse; a failed
/// one changes nothing. Every change of stack membership is saved.
pub struct Journal<S: KvStore> {
    undo: Vec<Action>,
    redo: Vec<Action>,
    last: Option<LastAction>,
    codec: JournalCodec<S>,
    on_refresh: Option<RefreshListener>,
}

impl<S: KvStore> Journal<S> {
    /// Opens the journal with whatever history `store` holds.
    pub fn open(store: S, config: JournalConfig) -> Self {
        Self::open_at(store, config, now_ms())
    }

    /// Like [`Journal::open`] with an explicit clock for age eviction.
    pub fn open_at(store: S, config: JournalConfig, now: TimestampMs) -> Self {
        let codec = JournalCodec::new(store, config);
        let LoadedHistory { undo, redo } = codec.load_at(now);
        Self {
            undo,
            redo,
            last: None,
            codec,
            on_refresh: None,
        }
    }

    /// Registers the callback run after every successful undo or redo.
    pub fn set_refresh_listener(&mut self, listener: impl FnMut() + Send + 'static) {
        self.on_refresh = Some(Box::new(listener));
    }

    /// Removes and returns the registered refresh callback.
    pub fn take_refresh_listener(&mut self) -> Option<RefreshListener> {
        self.on_refresh.take()
    }

    /// Appends an action, clearing the redo stack.
    pub fn push_action(&mut self, draft: ActionDraft) -> Action {
        let action = draft.into_action(now_ms());
        let max = self.codec.config().max_stack_size;
        push_bounded(&mut self.undo, action.clone(), max);
        self.redo.clear();
        self.last = Some(LastAction::new(action.clone(), Disposition::Pushed));
        debug!(id = %action.id, "pushed action: {}", action.description);
        self.persist();
        action
    }

    /// Reverses the most recent action. `Ok(None)` when there is nothing to undo.
    pub fn undo<R>(&mut self, repo: &mut R) -> Result<Option<Action>, JournalError>
    where
        R: EntityRepository + ?Sized,
    {
        let Some(top) = self.undo.last() else {
            return Ok(None);
        };

        let updated = execute_undo(top, repo).map_err(|err| {
            warn!(id = %top.id, "undo of \"{}\" failed: {err}", top.description);
            JournalError::Undo(err)
        })?;

        let old_id = top.entity_id;
        self.undo.pop();
        let max = self.codec.config().max_stack_size;
        push_bounded(&mut self.redo, updated.clone(), max);
        self.follow_recreated(updated.entity_type, old_id, updated.entity_id);
        self.last = Some(LastAction::new(updated.clone(), Disposition::Undone));
        debug!(id = %updated.id, "undid action: {}", updated.description);
        self.refresh();
        self.persist();
        Ok(Some(updated))
    }

    /// Re-applies the most recently undone action. `Ok(None)` when there is nothing to redo.
    pub fn redo<R>(&mut self, repo: &mut R) -> Result<Option<Action>, JournalError>
    where
        R: EntityRepository + ?Sized,
    {
        let Some(top) = self.redo.last() else {
            return Ok(None);
        };

        let updated = execute_redo(top, repo).map_err(|err| {
            warn!(id = %top.id, "redo of \"{}\" failed: {err}", top.description);
            JournalError::Redo(err)
        })?;

        let old_id = top.entity_id;
        self.redo.pop();
        let max = self.codec.config().max_stack_size;
        push_bounded(&mut self.undo, updated.clone(), max);
        self.follow_recreated(updated.entity_type, old_id, updated.entity_id);
        self.last = Some(LastAction::new(updated.clone(), Disposition::Redone));
        debug!(id = %updated.id, "redid action: {}", updated.description);
        self.refresh();
        self.persist();
        Ok(Some(updated))
    }

    /// Drops all history, in memory and on disk.
    ///
    /// Meant for when the backing store itself was reset.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.last = None;
        self.codec.clear();
    }

    /// Creates a record and records the creation.
    pub fn create_tracked<R>(
        &mut self,
        repo: &mut R,
        kind: EntityKind,
        data: Snapshot,
    ) -> Result<Action, JournalError>
    where
        R: EntityRepository + ?Sized,
    {
        let id = repo.create_entity(kind, &data)?;
        repo.commit()?;
        let created = repo.get_entity(kind, id)?.unwrap_or_else(|| data.with_id(id));
        Ok(self.push_action(ActionDraft::create(kind, id, created)))
    }

    /// Patches a record and records the fields it overwrote.
    pub fn update_tracked<R>(
        &mut self,
        repo: &mut R,
        kind: EntityKind,
        id: EntityId,
        patch: Snapshot,
    ) -> Result<Action, JournalError>
    where
        R: EntityRepository + ?Sized,
    {
        let current = repo
            .get_entity(kind, id)?
            .ok_or(RepoError::NotFound { kind, id })?;
        let previous = patch.capture_inverse_for(&current);
        repo.update_entity(kind, id, &patch)?;
        repo.commit()?;

        let renamed = patch.display_name().is_some();
        let mut draft = ActionDraft::update(kind, id, previous, patch);
        if !renamed {
            if let Some(name) = current.display_name() {
                draft = draft.with_description(format!("Updated {} \"{name}\"", kind.noun()));
            }
        }
        Ok(self.push_action(draft))
    }

    /// Deletes a record and records its full snapshot.
    pub fn delete_tracked<R>(
        &mut self,
        repo: &mut R,
        kind: EntityKind,
        id: EntityId,
    ) -> Result<Action, JournalError>
    where
        R: EntityRepository + ?Sized,
    {
        let snapshot = repo
            .get_entity(kind, id)?
            .ok_or(RepoError::NotFound { kind, id })?;
        repo.delete_entity(kind, id)?;
        repo.commit()?;
        Ok(self.push_action(ActionDraft::delete(kind, id, snapshot)))
    }

    pub fn status(&self) -> JournalStatus {
        JournalStatus::project(&self.undo, &self.redo, self.last.as_ref())
    }

    pub fn undo_stack(&self) -> &[Action] {
        &self.undo
    }

    pub fn redo_stack(&self) -> &[Action] {
        &self.redo
    }

    pub fn last_action(&self) -> Option<&LastAction> {
        self.last.as_ref()
    }

    pub fn config(&self) -> &JournalConfig {
        self.codec.config()
    }

    /// Durable store backing this journal.
    pub fn store(&self) -> &S {
        self.codec.store()
    }

    pub fn store_mut(&mut self) -> &mut S {
        self.codec.store_mut()
    }

    /// Points every stacked action at a record that was recreated under a new id.
    fn follow_recreated(&mut self, kind: EntityKind, old_id: EntityId, new_id: EntityId) {
        if old_id == new_id {
            return;
        }
        debug!(%kind, old_id, new_id, "rebinding history to recreated record");
        for action in self.undo.iter_mut().chain(self.redo.iter_mut()) {
            action.rebind(kind, old_id, new_id);
        }
    }

    fn refresh(&mut self) {
        if let Some(listener) = self.on_refresh.as_mut() {
            listener();
        }
    }

    fn persist(&mut self) {
        let outcome = self.codec.save(&self.undo, &self.redo);
        debug!(?outcome, "saved undo history");
    }
}

impl<S: KvStore> UndoHistory for Journal<S> {
    fn push_action(&mut self, draft: ActionDraft) -> Option<Action> {
        Some(Journal::push_action(self, draft))
    }

    fn undo(&mut self, repo: &mut dyn EntityRepository) -> Result<Option<Action>, JournalError> {
        Journal::undo(self, repo)
    }

    fn redo(&mut self, repo: &mut dyn EntityRepository) -> Result<Option<Action>, JournalError> {
        Journal::redo(self, repo)
    }

    fn clear(&mut self) {
        Journal::clear(self)
    }

    fn status(&self) -> JournalStatus {
        Journal::status(self)
    }
}

fn push_bounded(stack: &mut Vec<Action>, action: Action, max: usize) {
    stack.push(action);
    let excess = stack.len().saturating_sub(max);
    stack.drain(..excess);
}
