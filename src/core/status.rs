use serde::Serialize;

use crate::{
    action::Action,
    types::{TimestampMs, now_ms},
};

/// How the last action reached its current stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Disposition {
    Pushed,
    Undone,
    Redone,
}

/// Most recently pushed, undone or redone action, for feedback only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastAction {
    pub action: Action,
    pub disposition: Disposition,
    pub recorded_at: TimestampMs,
}

impl LastAction {
    pub fn new(action: Action, disposition: Disposition) -> Self {
        Self {
            action,
            disposition,
            recorded_at: now_ms(),
        }
    }

    pub fn was_undone(&self) -> bool {
        self.disposition == Disposition::Undone
    }

    pub fn was_redone(&self) -> bool {
        self.disposition == Disposition::Redone
    }

    /// Description prefixed with what just happened to the action.
    pub fn description(&self) -> String {
        match self.disposition {
            Disposition::Pushed => self.action.description.clone(),
            Disposition::Undone => format!("Undid: {}", self.action.description),
            Disposition::Redone => format!("Redid: {}", self.action.description),
        }
    }

    /// True while the notice is inside its display window.
    pub fn is_visible(&self, now: TimestampMs, visible_for_ms: u64) -> bool {
        now >= self.recorded_at && now - self.recorded_at < visible_for_ms
    }
}

/// Derived view of the journal. Holds no state of its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_count: usize,
    pub redo_count: usize,
    pub last_action_description: Option<String>,
    pub last_action: Option<LastAction>,
}

impl JournalStatus {
    pub fn project(undo: &[Action], redo: &[Action], last: Option<&LastAction>) -> Self {
        Self {
            can_undo: !undo.is_empty(),
            can_redo: !redo.is_empty(),
            undo_count: undo.len(),
            redo_count: redo.len(),
            last_action_description: last.map(LastAction::description),
            last_action: last.cloned(),
        }
    }

    /// Notice text to show at `now`, if it has not faded yet.
    pub fn notice(&self, now: TimestampMs, visible_for_ms: u64) -> Option<&str> {
        let last = self.last_action.as_ref()?;
        if !last.is_visible(now, visible_for_ms) {
            return None;
        }
        self.last_action_description.as_deref()
    }
}
