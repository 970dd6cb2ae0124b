use hashbrown::HashMap;

use crate::{
    entity::{ID_FIELD, Snapshot},
    types::{EntityId, EntityKind, now_ms},
};

use super::traits::{EntityRepository, RepoError, RepoResult};

/// Folders and items held in memory.
///
/// Ids are assigned per kind and never reused, like an autoincrement column.
/// A folder can only be deleted once it is empty. Creating an item requires
/// its folder to exist.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    folders: HashMap<EntityId, Snapshot>,
    items: HashMap<EntityId, Snapshot>,
    next_folder_id: EntityId,
    next_item_id: EntityId,
    commits: usize,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            next_folder_id: 1,
            next_item_id: 1,
            ..Self::default()
        }
    }

    pub fn get(&self, kind: EntityKind, id: EntityId) -> Option<&Snapshot> {
        self.table(kind).get(&id)
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.table(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.items.is_empty()
    }

    /// Sorted ids of every record of `kind`.
    pub fn ids(&self, kind: EntityKind) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.table(kind).keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of commits observed so far.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    fn table(&self, kind: EntityKind) -> &HashMap<EntityId, Snapshot> {
        match kind {
            EntityKind::Folder => &self.folders,
            EntityKind::Item => &self.items,
        }
    }

    fn table_mut(&mut self, kind: EntityKind) -> &mut HashMap<EntityId, Snapshot> {
        match kind {
            EntityKind::Folder => &mut self.folders,
            EntityKind::Item => &mut self.items,
        }
    }

    fn take_next_id(&mut self, kind: EntityKind) -> EntityId {
        let next = match kind {
            EntityKind::Folder => &mut self.next_folder_id,
            EntityKind::Item => &mut self.next_item_id,
        };
        let id = (*next).max(1);
        *next = id + 1;
        id
    }
}

impl EntityRepository for MemoryRepository {
    fn create_entity(&mut self, kind: EntityKind, data: &Snapshot) -> RepoResult<EntityId> {
        if kind == EntityKind::Item {
            if let Some(folder_id) = data.folder_id() {
                if !self.folders.contains_key(&folder_id) {
                    return Err(RepoError::NotFound {
                        kind: EntityKind::Folder,
                        id: folder_id,
                    });
                }
            }
        }

        let id = self.take_next_id(kind);
        let ts = now_ms();
        let record = data
            .clone()
            .with(ID_FIELD, id)
            .with("created_at", ts)
            .with("updated_at", ts);
        self.table_mut(kind).insert(id, record);
        Ok(id)
    }

    fn update_entity(&mut self, kind: EntityKind, id: EntityId, patch: &Snapshot) -> RepoResult<()> {
        let rec = self
            .table_mut(kind)
            .get_mut(&id)
            .ok_or(RepoError::NotFound { kind, id })?;
        patch.without_generated_fields().apply_to(rec);
        rec.insert("updated_at", now_ms());
        Ok(())
    }

    fn delete_entity(&mut self, kind: EntityKind, id: EntityId) -> RepoResult<()> {
        if kind == EntityKind::Folder {
            let items = self
                .items
                .values()
                .filter(|item| item.folder_id() == Some(id))
                .count();
            if items > 0 {
                return Err(RepoError::FolderNotEmpty { id, items });
            }
        }
        self.table_mut(kind).remove(&id);
        Ok(())
    }

    fn get_entity(&self, kind: EntityKind, id: EntityId) -> RepoResult<Option<Snapshot>> {
        Ok(self.get(kind, id).cloned())
    }

    fn commit(&mut self) -> RepoResult<()> {
        self.commits += 1;
        Ok(())
    }
}
