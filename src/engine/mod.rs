//! Inverse/forward dispatch against the host repository.

/// Undo and redo executors.
pub mod dispatch;
/// Reference two-level in-memory repository.
pub mod memory;
/// Repository collaborator trait and its errors.
pub mod traits;
