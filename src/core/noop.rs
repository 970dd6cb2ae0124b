use crate::{
    action::{Action, ActionDraft},
    engine::traits::EntityRepository,
};

use super::{
    journal::{JournalError, UndoHistory},
    status::JournalStatus,
};

/// History that records nothing.
///
/// Hand this to components that may run without an active journal so they
/// can push and query unconditionally.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopJournal;

impl UndoHistory for NoopJournal {
    fn push_action(&mut self, _draft: ActionDraft) -> Option<Action> {
        None
    }

    fn undo(&mut self, _repo: &mut dyn EntityRepository) -> Result<Option<Action>, JournalError> {
        Ok(None)
    }

    fn redo(&mut self, _repo: &mut dyn EntityRepository) -> Result<Option<Action>, JournalError> {
        Ok(None)
    }

    fn clear(&mut self) {}

    fn status(&self) -> JournalStatus {
        JournalStatus::default()
    }
}
