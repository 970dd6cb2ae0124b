//! Versioned journal blob stored under a single key.
//!
//! Loading never fails: a missing, unreadable or version-mismatched blob is
//! treated as empty history. Saving never fails either; when the store runs
//! out of room the stacks are cut to the fallback size, and if that still
//! does not fit the blob is removed so no stale history survives.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{
    action::Action,
    config::JournalConfig,
    types::{TimestampMs, now_ms},
};

use super::{KvStore, PersistResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEnvelopeRef<'a> {
    schema_version: u32,
    undo_stack: &'a [Action],
    redo_stack: &'a [Action],
    saved_at: TimestampMs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEnvelope {
    #[serde(default)]
    undo_stack: Vec<Action>,
    #[serde(default)]
    redo_stack: Vec<Action>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionProbe {
    schema_version: u32,
}

/// Stacks recovered from the durable store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedHistory {
    pub undo: Vec<Action>,
    pub redo: Vec<Action>,
}

/// How a save ended. Callers only use this for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Both stacks written at full size.
    Saved,
    /// Quota hit; stacks written at the fallback size.
    Trimmed,
    /// Nothing could be written; the blob was removed.
    Discarded,
    /// The blob could not even be removed.
    Failed,
}

/// Reads and writes the journal blob through a [`KvStore`].
pub struct JournalCodec<S: KvStore> {
    store: S,
    config: JournalConfig,
}

impl<S: KvStore> JournalCodec<S> {
    pub fn new(store: S, config: JournalConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    /// Loads history as of now.
    pub fn load(&self) -> LoadedHistory {
        self.load_at(now_ms())
    }

    /// Loads history, dropping actions not newer than `now - max_age`.
    pub fn load_at(&self, now: TimestampMs) -> LoadedHistory {
        let raw = match self.store.get(&self.config.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return LoadedHistory::default(),
            Err(err) => {
                warn!("reading undo history failed: {err}");
                return LoadedHistory::default();
            }
        };

        let env = match decode_history(&raw, self.config.schema_version) {
            Ok(env) => env,
            Err(reason) => {
                debug!("discarding persisted undo history: {reason}");
                return LoadedHistory::default();
            }
        };

        let cutoff = now.saturating_sub(self.config.max_age_ms());
        let max = self.config.max_stack_size;
        let keep = |mut stack: Vec<Action>| -> Vec<Action> {
            stack.retain(|a| a.timestamp > cutoff);
            let excess = stack.len().saturating_sub(max);
            stack.drain(..excess);
            stack
        };

        let history = LoadedHistory {
            undo: keep(env.undo_stack),
            redo: keep(env.redo_stack),
        };
        debug!(
            undo = history.undo.len(),
            redo = history.redo.len(),
            "loaded undo history"
        );
        history
    }

    /// Persists both stacks, degrading instead of failing.
    pub fn save(&mut self, undo: &[Action], redo: &[Action]) -> SaveOutcome {
        self.save_at(undo, redo, now_ms())
    }

    pub fn save_at(&mut self, undo: &[Action], redo: &[Action], now: TimestampMs) -> SaveOutcome {
        let max = self.config.max_stack_size;
        match self.write(undo, redo, max, now) {
            Ok(()) => SaveOutcome::Saved,
            Err(err) if err.is_quota() => {
                let fallback = self.config.fallback_stack_size.min(max);
                warn!("undo history hit storage quota, keeping last {fallback}: {err}");
                match self.write(undo, redo, fallback, now) {
                    Ok(()) => SaveOutcome::Trimmed,
                    Err(err) => {
                        warn!("trimmed undo history still not saved: {err}");
                        self.discard()
                    }
                }
            }
            Err(err) => {
                warn!("saving undo history failed: {err}");
                self.discard()
            }
        }
    }

    /// Removes the persisted blob.
    pub fn clear(&mut self) {
        match self.store.remove(&self.config.storage_key) {
            Ok(()) => debug!("cleared persisted undo history"),
            Err(err) => error!("clearing undo history failed: {err}"),
        }
    }

    fn write(&mut self, undo: &[Action], redo: &[Action], cap: usize, now: TimestampMs) -> PersistResult<()> {
        let env = HistoryEnvelopeRef {
            schema_version: self.config.schema_version,
            undo_stack: tail(undo, cap),
            redo_stack: tail(redo, cap),
            saved_at: now,
        };
        let payload = serde_json::to_string(&env)?;
        self.store.set(&self.config.storage_key, &payload)
    }

    fn discard(&mut self) -> SaveOutcome {
        match self.store.remove(&self.config.storage_key) {
            Ok(()) => SaveOutcome::Discarded,
            Err(err) => {
                error!("removing undo history after failed save failed: {err}");
                SaveOutcome::Failed
            }
        }
    }
}

/// Most recent `cap` entries.
fn tail(stack: &[Action], cap: usize) -> &[Action] {
    &stack[stack.len().saturating_sub(cap)..]
}

fn decode_history(raw: &str, expected_version: u32) -> Result<HistoryEnvelope, String> {
    let probe: VersionProbe =
        serde_json::from_str(raw).map_err(|e| format!("history header decode failed: {e}"))?;
    if probe.schema_version != expected_version {
        return Err(format!(
            "unsupported history schema version: {}",
            probe.schema_version
        ));
    }
    serde_json::from_str(raw).map_err(|e| format!("history payload decode failed: {e}"))
}
