//! Undo/redo action journal for a two-level folder/item store.
//!
//! Every create, update or delete the host performs is recorded as an
//! [`action::Action`] carrying what its inverse needs. Undo and redo run that
//! inverse or forward operation against the host's
//! [`engine::traits::EntityRepository`] and only move the action between
//! stacks once it succeeded. History survives restarts through a versioned
//! blob in a [`persist::KvStore`], bounded by count and age.
//!
//! # Examples
//!
//! Synchronous usage with the in-memory repository and store:
//! ```
//! use undolog::{
//!     config::JournalConfig,
//!     core::journal::Journal,
//!     engine::memory::MemoryRepository,
//!     entity::Snapshot,
//!     persist::memory::MemoryKvStore,
//!     types::EntityKind,
//! };
//!
//! let mut repo = MemoryRepository::new();
//! let mut journal = Journal::open(MemoryKvStore::new(), JournalConfig::default());
//!
//! let action = journal
//!     .create_tracked(&mut repo, EntityKind::Folder, Snapshot::new().with("name", "Invoices"))
//!     .expect("create");
//! assert_eq!(journal.status().undo_count, 1);
//!
//! journal.undo(&mut repo).expect("undo");
//! assert!(repo.get(EntityKind::Folder, action.entity_id).is_none());
//! assert_eq!(
//!     journal.status().last_action_description.as_deref(),
//!     Some("Undid: Created folder \"Invoices\"")
//! );
//! ```
//!
//! Runtime usage with a SQLite-backed store:
//! ```no_run
//! use undolog::{
//!     config::JournalConfig,
//!     core::journal::Journal,
//!     engine::memory::MemoryRepository,
//!     entity::Snapshot,
//!     persist::sqlite::SqliteKvStore,
//!     runtime::handle::{RuntimeConfig, spawn_journal},
//!     types::EntityKind,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = SqliteKvStore::open("history.db").expect("open sqlite");
//! let journal = Journal::open(store, JournalConfig::default());
//! let handle = spawn_journal(journal, MemoryRepository::new(), RuntimeConfig::default());
//! handle
//!     .create(EntityKind::Folder, Snapshot::new().with("name", "Invoices"))
//!     .await
//!     .expect("create");
//! handle.undo().await.expect("undo");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```

/// Reversible action model.
pub mod action;
/// Retention and persistence limits.
pub mod config;
/// Journal engine, status projection and no-op journal.
pub mod core;
/// Inverse/forward dispatch and the repository collaborator.
pub mod engine;
/// Entity snapshots.
pub mod entity;
/// Durable key-value stores and the journal codec.
pub mod persist;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Shared primitive types.
pub mod types;
