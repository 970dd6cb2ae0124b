//! Shared primitive IDs, entity kinds and clock helpers.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Identifier assigned to a folder or item by the host repository.
pub type EntityId = u64;
/// Milliseconds since the Unix epoch.
pub type TimestampMs = u64;

/// Milliseconds in one day.
pub const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// Kind of record an action touches in the two-level store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    /// Top-level container.
    Folder,
    /// Record living inside a folder.
    Item,
}

impl EntityKind {
    /// Lower-case noun used in descriptions and log lines.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Item => "item",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> TimestampMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
