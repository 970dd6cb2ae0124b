//! Runtime event stream payloads.

use crate::action::ActionId;

/// Events emitted from the single-writer journal loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEvent {
    /// An action was recorded.
    Pushed {
        /// Recorded action id.
        action_id: ActionId,
    },
    /// The top undo entry was reversed.
    Undone {
        /// Moved action id.
        action_id: ActionId,
    },
    /// The top redo entry was re-applied.
    Redone {
        /// Moved action id.
        action_id: ActionId,
    },
    /// An undo was refused; stacks are unchanged.
    UndoFailed {
        /// User-facing reason.
        message: String,
    },
    /// A redo was refused; stacks are unchanged.
    RedoFailed {
        /// User-facing reason.
        message: String,
    },
    /// All history was dropped.
    Cleared,
    /// Repository contents changed through undo or redo; views should re-read.
    Refresh,
}
