//! Undo/redo journal engine and its derived status.

/// Stack-owning journal engine.
pub mod journal;
/// Journal stand-in for contexts without history.
pub mod noop;
/// UI-facing projection of journal state.
pub mod status;
