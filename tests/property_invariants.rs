use std::collections::HashSet;

use proptest::prelude::*;

use undolog::{
    action::{Action, ActionDraft},
    config::JournalConfig,
    core::journal::Journal,
    engine::traits::{EntityRepository, RepoError, RepoResult},
    entity::Snapshot,
    persist::memory::MemoryKvStore,
    types::{EntityId, EntityKind},
};

const MAX: usize = 5;

#[derive(Debug, Clone)]
enum Step {
    Push { id: u8, item: bool },
    Update { id: u8 },
    Undo { fail: bool },
    Redo { fail: bool },
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u8..32, any::<bool>()).prop_map(|(id, item)| Step::Push { id, item }),
        (0u8..32).prop_map(|id| Step::Update { id }),
        prop::bool::weighted(0.2).prop_map(|fail| Step::Undo { fail }),
        prop::bool::weighted(0.2).prop_map(|fail| Step::Redo { fail }),
    ]
}

/// Accepts every call unless `fail` is set.
struct ToggleRepo {
    fail: bool,
    next_id: EntityId,
}

impl ToggleRepo {
    fn check(&self) -> RepoResult<()> {
        if self.fail {
            return Err(RepoError::Message("offline".to_string()));
        }
        Ok(())
    }
}

impl EntityRepository for ToggleRepo {
    fn create_entity(&mut self, _kind: EntityKind, _data: &Snapshot) -> RepoResult<EntityId> {
        self.check()?;
        self.next_id += 1;
        Ok(self.next_id)
    }

    fn update_entity(&mut self, _kind: EntityKind, _id: EntityId, _patch: &Snapshot) -> RepoResult<()> {
        self.check()
    }

    fn delete_entity(&mut self, _kind: EntityKind, _id: EntityId) -> RepoResult<()> {
        self.check()
    }

    fn get_entity(&self, kind: EntityKind, id: EntityId) -> RepoResult<Option<Snapshot>> {
        Ok(Some(Snapshot::new().with("id", id).with("kind", kind.noun())))
    }
}

fn ids(stack: &[Action]) -> Vec<String> {
    stack.iter().map(|a| a.id.clone()).collect()
}

proptest! {
    #[test]
    fn random_sequences_preserve_stack_invariants(steps in prop::collection::vec(step_strategy(), 1..200)) {
        let config = JournalConfig {
            max_stack_size: MAX,
            ..JournalConfig::default()
        };
        let mut journal = Journal::open(MemoryKvStore::new(), config);
        let mut repo = ToggleRepo { fail: false, next_id: 1_000 };

        for step in steps {
            let undo_before = ids(journal.undo_stack());
            let redo_before = ids(journal.redo_stack());

            match step {
                Step::Push { id, item } => {
                    let kind = if item { EntityKind::Item } else { EntityKind::Folder };
                    let data = Snapshot::new().with("id", u64::from(id)).with("folder_id", 1);
                    let pushed = journal.push_action(ActionDraft::create(kind, u64::from(id), data));
                    prop_assert!(journal.redo_stack().is_empty());
                    prop_assert_eq!(journal.undo_stack().last().map(|a| a.id.clone()), Some(pushed.id));
                }
                Step::Update { id } => {
                    journal.push_action(ActionDraft::update(
                        EntityKind::Folder,
                        u64::from(id),
                        Snapshot::new().with("name", "before"),
                        Snapshot::new().with("name", "after"),
                    ));
                    prop_assert!(journal.redo_stack().is_empty());
                }
                Step::Undo { fail } => {
                    repo.fail = fail;
                    let res = journal.undo(&mut repo);
                    match res {
                        Ok(Some(moved)) => {
                            prop_assert_eq!(undo_before.last(), Some(&moved.id));
                            prop_assert_eq!(journal.undo_stack().len(), undo_before.len() - 1);
                            prop_assert_eq!(journal.redo_stack().last().map(|a| a.id.clone()), Some(moved.id));
                        }
                        Ok(None) => prop_assert!(undo_before.is_empty()),
                        Err(_) => {
                            prop_assert!(fail);
                            prop_assert_eq!(ids(journal.undo_stack()), undo_before.clone());
                            prop_assert_eq!(ids(journal.redo_stack()), redo_before.clone());
                        }
                    }
                }
                Step::Redo { fail } => {
                    repo.fail = fail;
                    let res = journal.redo(&mut repo);
                    match res {
                        Ok(Some(moved)) => {
                            prop_assert_eq!(redo_before.last(), Some(&moved.id));
                            prop_assert_eq!(journal.redo_stack().len(), redo_before.len() - 1);
                            prop_assert_eq!(journal.undo_stack().last().map(|a| a.id.clone()), Some(moved.id));
                        }
                        Ok(None) => prop_assert!(redo_before.is_empty()),
                        Err(_) => {
                            prop_assert!(fail);
                            prop_assert_eq!(ids(journal.undo_stack()), undo_before.clone());
                            prop_assert_eq!(ids(journal.redo_stack()), redo_before.clone());
                        }
                    }
                }
            }

            let undo_len = journal.undo_stack().len();
            let redo_len = journal.redo_stack().len();
            prop_assert!(undo_len <= MAX);
            prop_assert!(redo_len <= MAX);
            prop_assert!(undo_len + redo_len <= MAX);

            let status = journal.status();
            prop_assert_eq!(status.can_undo, undo_len > 0);
            prop_assert_eq!(status.can_redo, redo_len > 0);

            let unique: HashSet<String> = ids(journal.undo_stack())
                .into_iter()
                .chain(ids(journal.redo_stack()))
                .collect();
            prop_assert_eq!(unique.len(), undo_len + redo_len);
        }

        let reopened = Journal::open(journal.store().clone(), JournalConfig {
            max_stack_size: MAX,
            ..JournalConfig::default()
        });
        prop_assert_eq!(reopened.undo_stack(), journal.undo_stack());
        prop_assert_eq!(reopened.redo_stack(), journal.redo_stack());
    }
}
