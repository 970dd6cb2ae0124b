//! Undo and redo executors.
//!
//! Each executor performs exactly one repository mutation followed by a
//! commit and hands back an updated copy of the action. The caller decides
//! what to do with the stacks; nothing here touches them.

use thiserror::Error;

use crate::{
    action::{Action, Change},
    types::{EntityId, EntityKind},
};

use super::traits::{EntityRepository, RepoError};

/// Reason an inverse or forward operation could not run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("cannot restore item: its folder {folder_id} no longer exists")]
    MissingParent { folder_id: EntityId },
    #[error(transparent)]
    Repository(#[from] RepoError),
}

/// Reverses `action`.
///
/// Undoing a delete recreates the record; the returned copy points at the
/// newly assigned id so a later redo removes the right record.
pub fn execute_undo<R>(action: &Action, repo: &mut R) -> Result<Action, DispatchError>
where
    R: EntityRepository + ?Sized,
{
    let kind = action.entity_type;
    let out = match &action.change {
        Change::Create { .. } => {
            repo.delete_entity(kind, action.entity_id)?;
            action.clone()
        }
        Change::Update { previous_state, .. } => {
            repo.update_entity(kind, action.entity_id, previous_state)?;
            action.clone()
        }
        Change::Delete { deleted_entity } => {
            if kind == EntityKind::Item {
                if let Some(folder_id) = deleted_entity.folder_id() {
                    if repo.get_entity(EntityKind::Folder, folder_id)?.is_none() {
                        return Err(DispatchError::MissingParent { folder_id });
                    }
                }
            }
            let new_id = repo.create_entity(kind, &deleted_entity.without_generated_fields())?;
            action.retargeted(new_id)
        }
    };
    repo.commit()?;
    Ok(out)
}

/// Re-applies `action` after it was undone.
pub fn execute_redo<R>(action: &Action, repo: &mut R) -> Result<Action, DispatchError>
where
    R: EntityRepository + ?Sized,
{
    let kind = action.entity_type;
    let out = match &action.change {
        Change::Create { entity_data } => {
            let new_id = repo.create_entity(kind, &entity_data.without_generated_fields())?;
            action.retargeted(new_id)
        }
        Change::Update { new_state, .. } => {
            repo.update_entity(kind, action.entity_id, new_state)?;
            action.clone()
        }
        Change::Delete { deleted_entity } => {
            let id = deleted_entity.id().unwrap_or(action.entity_id);
            repo.delete_entity(kind, id)?;
            action.clone()
        }
    };
    repo.commit()?;
    Ok(out)
}
