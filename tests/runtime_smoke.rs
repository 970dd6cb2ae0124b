use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use serde_json::json;

use undolog::{
    action::ActionDraft,
    config::JournalConfig,
    core::journal::{Journal, JournalError},
    engine::{dispatch::DispatchError, memory::MemoryRepository},
    entity::Snapshot,
    persist::memory::MemoryKvStore,
    runtime::{
        events::JournalEvent,
        handle::{RuntimeConfig, RuntimeError, spawn_journal},
    },
    types::EntityKind,
};

fn journal() -> Journal<MemoryKvStore> {
    Journal::open(MemoryKvStore::new(), JournalConfig::default())
}

async fn next_event(sub: &mut tokio::sync::broadcast::Receiver<JournalEvent>) -> JournalEvent {
    tokio::time::timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("event")
        .expect("recv")
}

#[tokio::test]
async fn runtime_tracks_mutations_and_emits_ordered_events() {
    let handle = spawn_journal(journal(), MemoryRepository::new(), RuntimeConfig::default());
    let mut sub = handle.subscribe();

    let created = handle
        .create(EntityKind::Folder, Snapshot::new().with("name", "Invoices"))
        .await
        .expect("create");
    let id = created.entity_id;
    handle
        .update(EntityKind::Folder, id, Snapshot::new().with("name", "Bills"))
        .await
        .expect("update");

    let undone = handle.undo().await.expect("undo").expect("action");
    let folder = handle.get(EntityKind::Folder, id).await.expect("get").expect("folder");
    assert_eq!(folder.get("name"), Some(&json!("Invoices")));

    let status = handle.status().await.expect("status");
    assert_eq!((status.undo_count, status.redo_count), (1, 1));
    assert_eq!(
        status.last_action_description.as_deref(),
        Some("Undid: Updated folder \"Bills\"")
    );

    assert_eq!(
        next_event(&mut sub).await,
        JournalEvent::Pushed {
            action_id: created.id.clone()
        }
    );
    assert!(matches!(next_event(&mut sub).await, JournalEvent::Pushed { .. }));
    assert_eq!(next_event(&mut sub).await, JournalEvent::Refresh);
    assert_eq!(
        next_event(&mut sub).await,
        JournalEvent::Undone {
            action_id: undone.id
        }
    );

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn failed_undo_is_reported_and_stacks_survive() {
    let handle = spawn_journal(journal(), MemoryRepository::new(), RuntimeConfig::default());
    let mut sub = handle.subscribe();

    let snapshot = Snapshot::from_value(json!({"id": 9, "folder_id": 55, "name": "scan.pdf"}))
        .expect("object");
    handle
        .push(ActionDraft::delete(EntityKind::Item, 9, snapshot))
        .await
        .expect("push");
    assert!(matches!(next_event(&mut sub).await, JournalEvent::Pushed { .. }));

    let err = handle.undo().await.expect_err("parent missing");
    assert!(matches!(
        err,
        RuntimeError::Journal(JournalError::Undo(DispatchError::MissingParent { folder_id: 55 }))
    ));
    assert!(matches!(next_event(&mut sub).await, JournalEvent::UndoFailed { .. }));

    let status = handle.status().await.expect("status");
    assert_eq!((status.undo_count, status.redo_count), (1, 0));

    handle.clear().await.expect("clear");
    assert_eq!(next_event(&mut sub).await, JournalEvent::Cleared);
    assert!(!handle.status().await.expect("status").can_undo);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn concurrent_callers_are_serialized() {
    let handle = spawn_journal(journal(), MemoryRepository::new(), RuntimeConfig::default());

    let mut tasks = Vec::new();
    for i in 0..20u64 {
        let h = handle.clone();
        tasks.push(tokio::spawn(async move {
            h.create(EntityKind::Folder, Snapshot::new().with("name", format!("F{i}")))
                .await
                .expect("create")
        }));
    }
    for task in tasks {
        task.await.expect("join");
    }

    for _ in 0..5 {
        handle.undo().await.expect("undo").expect("action");
    }
    let status = handle.status().await.expect("status");
    assert_eq!((status.undo_count, status.redo_count), (15, 5));

    handle.shutdown().await.expect("shutdown");
    assert!(matches!(handle.status().await, Err(RuntimeError::ChannelClosed)));
}

#[tokio::test]
async fn host_refresh_listener_survives_spawn() {
    let refreshes = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&refreshes);
    let mut journal = journal();
    journal.set_refresh_listener(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let handle = spawn_journal(journal, MemoryRepository::new(), RuntimeConfig::default());
    let mut sub = handle.subscribe();

    handle
        .create(EntityKind::Folder, Snapshot::new().with("name", "Invoices"))
        .await
        .expect("create");
    handle.undo().await.expect("undo").expect("action");

    assert!(matches!(next_event(&mut sub).await, JournalEvent::Pushed { .. }));
    assert_eq!(next_event(&mut sub).await, JournalEvent::Refresh);
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);

    handle.shutdown().await.expect("shutdown");
}
