use thiserror::Error;

use crate::{
    entity::Snapshot,
    types::{EntityId, EntityKind},
};

/// Failure reported by the host's CRUD layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: EntityId },
    #[error("folder {id} still holds {items} item(s)")]
    FolderNotEmpty { id: EntityId, items: usize },
    #[error("{0}")]
    Message(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// CRUD surface the journal calls to apply inverse and forward operations.
///
/// Every mutating call is followed by [`EntityRepository::commit`] before the
/// journal treats the operation as done.
pub trait EntityRepository {
    /// Persists a new record and returns its assigned id.
    fn create_entity(&mut self, kind: EntityKind, data: &Snapshot) -> RepoResult<EntityId>;
    /// Applies a sparse patch to an existing record.
    fn update_entity(&mut self, kind: EntityKind, id: EntityId, patch: &Snapshot) -> RepoResult<()>;
    /// Removes a record. An absent id is not an error.
    ///
    /// Must not remove other records: a folder that still holds items is
    /// refused with [`RepoError::FolderNotEmpty`].
    fn delete_entity(&mut self, kind: EntityKind, id: EntityId) -> RepoResult<()>;
    /// Reads the current record.
    fn get_entity(&self, kind: EntityKind, id: EntityId) -> RepoResult<Option<Snapshot>>;
    /// Durability barrier.
    fn commit(&mut self) -> RepoResult<()> {
        Ok(())
    }
}

impl<R: EntityRepository + ?Sized> EntityRepository for Box<R> {
    fn create_entity(&mut self, kind: EntityKind, data: &Snapshot) -> RepoResult<EntityId> {
        (**self).create_entity(kind, data)
    }

    fn update_entity(&mut self, kind: EntityKind, id: EntityId, patch: &Snapshot) -> RepoResult<()> {
        (**self).update_entity(kind, id, patch)
    }

    fn delete_entity(&mut self, kind: EntityKind, id: EntityId) -> RepoResult<()> {
        (**self).delete_entity(kind, id)
    }

    fn get_entity(&self, kind: EntityKind, id: EntityId) -> RepoResult<Option<Snapshot>> {
        (**self).get_entity(kind, id)
    }

    fn commit(&mut self) -> RepoResult<()> {
        (**self).commit()
    }
}
