//! Retention and persistence limits.

/// Maximum number of actions kept on each stack.
pub const MAX_STACK_SIZE: usize = 50;
/// Actions older than this many days are dropped on load.
pub const MAX_AGE_DAYS: u64 = 7;
/// Stack cap used when a save hits the store's quota.
pub const FALLBACK_STACK_SIZE: usize = 25;
/// Version tag written into the persisted blob.
pub const SCHEMA_VERSION: u32 = 1;
/// Key under which the journal blob is stored.
pub const STORAGE_KEY: &str = "undo_redo_history";
/// How long a last-action notice stays visible.
pub const NOTICE_VISIBLE_MS: u64 = 3_000;

/// Limits shared by the journal engine and its persistence codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalConfig {
    pub max_stack_size: usize,
    pub max_age_days: u64,
    pub fallback_stack_size: usize,
    pub schema_version: u32,
    pub storage_key: String,
    pub notice_visible_ms: u64,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            max_stack_size: MAX_STACK_SIZE,
            max_age_days: MAX_AGE_DAYS,
            fallback_stack_size: FALLBACK_STACK_SIZE,
            schema_version: SCHEMA_VERSION,
            storage_key: STORAGE_KEY.to_string(),
            notice_visible_ms: NOTICE_VISIBLE_MS,
        }
    }
}

impl JournalConfig {
    /// Age cutoff in milliseconds.
    pub fn max_age_ms(&self) -> u64 {
        self.max_age_days.saturating_mul(crate::types::DAY_MS)
    }
}
