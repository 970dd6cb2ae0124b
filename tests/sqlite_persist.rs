use serde_json::json;
use tempfile::TempDir;

use undolog::{
    action::ActionDraft,
    config::{JournalConfig, STORAGE_KEY},
    core::journal::Journal,
    engine::memory::MemoryRepository,
    entity::Snapshot,
    persist::{
        KvStore,
        codec::{JournalCodec, SaveOutcome},
        sqlite::SqliteKvStore,
    },
    types::{DAY_MS, EntityKind, now_ms},
};

fn folder(id: u64) -> ActionDraft {
    let data = Snapshot::from_value(json!({"id": id, "name": format!("Folder {id}")})).expect("object");
    ActionDraft::create(EntityKind::Folder, id, data)
}

#[test]
fn history_survives_reopen() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("history.db");

    let mut repo = MemoryRepository::new();
    let (undo, redo) = {
        let store = SqliteKvStore::open(&db_path).expect("open sqlite");
        let mut journal = Journal::open(store, JournalConfig::default());
        let a = journal
            .create_tracked(&mut repo, EntityKind::Folder, Snapshot::new().with("name", "Invoices"))
            .expect("create");
        journal
            .update_tracked(&mut repo, EntityKind::Folder, a.entity_id, Snapshot::new().with("name", "Bills"))
            .expect("update");
        journal.undo(&mut repo).expect("undo");
        (journal.undo_stack().to_vec(), journal.redo_stack().to_vec())
    };

    let store = SqliteKvStore::open(&db_path).expect("reopen");
    let mut journal = Journal::open(store, JournalConfig::default());
    assert_eq!(journal.undo_stack(), undo.as_slice());
    assert_eq!(journal.redo_stack(), redo.as_slice());

    journal.redo(&mut repo).expect("redo after restart");
    let folder = repo.get(EntityKind::Folder, undo[0].entity_id).expect("folder");
    assert_eq!(folder.get("name"), Some(&json!("Bills")));
}

#[test]
fn stale_actions_are_dropped_on_open() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("aged.db");
    let now = now_ms();

    {
        let store = SqliteKvStore::open(&db_path).expect("open sqlite");
        let mut journal = Journal::open(store, JournalConfig::default());
        journal.push_action(folder(1).at(now - 8 * DAY_MS));
        journal.push_action(folder(2).at(now - 2 * DAY_MS));
        journal.push_action(folder(3));
    }

    let store = SqliteKvStore::open(&db_path).expect("reopen");
    let journal = Journal::open_at(store, JournalConfig::default(), now);
    let ids: Vec<u64> = journal.undo_stack().iter().map(|a| a.entity_id).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn schema_mismatch_resets_history() {
    let mut store = SqliteKvStore::open_in_memory().expect("open");
    {
        let mut codec = JournalCodec::new(&mut store, JournalConfig::default());
        let action = folder(1).into_action(now_ms());
        assert_eq!(codec.save(&[action], &[]), SaveOutcome::Saved);
    }

    let config = JournalConfig {
        schema_version: 2,
        ..JournalConfig::default()
    };
    let journal = Journal::open(store, config);
    assert!(journal.undo_stack().is_empty());
    assert!(journal.redo_stack().is_empty());
}

#[test]
fn quota_fallback_keeps_most_recent_entries() {
    let now = now_ms();
    let actions: Vec<_> = (1..=50).map(|id| folder(id).into_action(now)).collect();

    let full_len = {
        let mut probe = SqliteKvStore::open_in_memory().expect("open");
        let mut codec = JournalCodec::new(&mut probe, JournalConfig::default());
        codec.save(&actions, &[]);
        probe.get(STORAGE_KEY).expect("get").expect("blob").len()
    };

    let store = SqliteKvStore::open_in_memory().expect("open").with_quota(full_len - 1);
    let mut codec = JournalCodec::new(store, JournalConfig::default());
    assert_eq!(codec.save(&actions, &[]), SaveOutcome::Trimmed);

    let loaded = codec.load();
    let ids: Vec<u64> = loaded.undo.iter().map(|a| a.entity_id).collect();
    assert_eq!(ids, (26..=50).collect::<Vec<_>>());
}

#[test]
fn quota_too_small_for_fallback_removes_blob() {
    let mut store = SqliteKvStore::open_in_memory().expect("open").with_quota(64);
    store.set(STORAGE_KEY, "{}").expect("seed");

    let mut codec = JournalCodec::new(store, JournalConfig::default());
    let actions: Vec<_> = (1..=3).map(|id| folder(id).into_action(now_ms())).collect();
    assert_eq!(codec.save(&actions, &[]), SaveOutcome::Discarded);
    assert_eq!(codec.store().get(STORAGE_KEY).expect("get"), None);
}
