//! Reversible action model and its persisted wire shape.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entity::{FOLDER_ID_FIELD, ID_FIELD, Snapshot},
    types::{EntityId, EntityKind, TimestampMs},
};

/// Opaque action identifier.
pub type ActionId = String;

/// Mutation recorded by an action, with the payload its inverse needs.
///
/// Serialized internally tagged so the blob reads
/// `{"type": "UPDATE", "previousState": {..}, "newState": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Change {
    /// Entity was created.
    Create {
        /// Full record as created, including its assigned id.
        entity_data: Snapshot,
    },
    /// Entity fields were overwritten.
    Update {
        /// Changed fields before the mutation.
        previous_state: Snapshot,
        /// Changed fields after the mutation.
        new_state: Snapshot,
    },
    /// Entity was removed.
    Delete {
        /// Full record at deletion time, parent key included.
        deleted_entity: Snapshot,
    },
}

impl Change {
    /// Verb used in descriptions.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create { .. } => "Created",
            Self::Update { .. } => "Updated",
            Self::Delete { .. } => "Deleted",
        }
    }

    fn snapshots_mut(&mut self) -> Vec<&mut Snapshot> {
        match self {
            Self::Create { entity_data } => vec![entity_data],
            Self::Update {
                previous_state,
                new_state,
            } => vec![previous_state, new_state],
            Self::Delete { deleted_entity } => vec![deleted_entity],
        }
    }
}

/// One reversible unit of work on the undo or redo stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Unique id, never reused.
    pub id: ActionId,
    /// Folder or item.
    pub entity_type: EntityKind,
    /// Affected record; rewritten when a recreation assigns a new id.
    pub entity_id: EntityId,
    /// Creation time in epoch milliseconds.
    pub timestamp: TimestampMs,
    /// Human-readable summary.
    pub description: String,
    /// Mutation payload.
    #[serde(flatten)]
    pub change: Change,
}

impl Action {
    /// Copy of this action targeting a recreated record.
    ///
    /// The id inside the stored snapshot follows so later dispatches agree
    /// with `entity_id`.
    pub fn retargeted(&self, new_id: EntityId) -> Self {
        let change = match &self.change {
            Change::Create { entity_data } => Change::Create {
                entity_data: entity_data.with_id(new_id),
            },
            Change::Delete { deleted_entity } => Change::Delete {
                deleted_entity: deleted_entity.with_id(new_id),
            },
            update @ Change::Update { .. } => update.clone(),
        };
        Self {
            entity_id: new_id,
            change,
            ..self.clone()
        }
    }

    /// Follows a record of `kind` that moved from `old_id` to `new_id`.
    ///
    /// Rewrites this action's target when it names the moved record, and
    /// the parent key of item snapshots when the moved record is a folder.
    pub fn rebind(&mut self, kind: EntityKind, old_id: EntityId, new_id: EntityId) {
        let own = self.entity_type == kind && self.entity_id == old_id;
        let child = kind == EntityKind::Folder && self.entity_type == EntityKind::Item;
        if own {
            self.entity_id = new_id;
        }
        for snapshot in self.change.snapshots_mut() {
            if own {
                snapshot.replace_ref(ID_FIELD, old_id, new_id);
            }
            if child {
                snapshot.replace_ref(FOLDER_ID_FIELD, old_id, new_id);
            }
        }
    }
}

/// Partially filled action handed to the journal.
///
/// `id` and `timestamp` are assigned on push when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDraft {
    pub id: Option<ActionId>,
    pub timestamp: Option<TimestampMs>,
    pub entity_type: EntityKind,
    pub entity_id: EntityId,
    pub description: String,
    pub change: Change,
}

impl ActionDraft {
    /// Draft for a freshly created record.
    pub fn create(kind: EntityKind, entity_id: EntityId, entity_data: Snapshot) -> Self {
        Self::described(kind, entity_id, Change::Create { entity_data })
    }

    /// Draft for an update, given the changed fields before and after.
    pub fn update(
        kind: EntityKind,
        entity_id: EntityId,
        previous_state: Snapshot,
        new_state: Snapshot,
    ) -> Self {
        Self::described(
            kind,
            entity_id,
            Change::Update {
                previous_state,
                new_state,
            },
        )
    }

    /// Draft for a deleted record.
    pub fn delete(kind: EntityKind, entity_id: EntityId, deleted_entity: Snapshot) -> Self {
        Self::described(kind, entity_id, Change::Delete { deleted_entity })
    }

    /// Replaces the generated description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Fixes the creation time instead of using the push time.
    pub fn at(mut self, timestamp: TimestampMs) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Fills in missing fields.
    pub fn into_action(self, now: TimestampMs) -> Action {
        Action {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            timestamp: self.timestamp.unwrap_or(now),
            description: self.description,
            change: self.change,
        }
    }

    fn described(kind: EntityKind, entity_id: EntityId, change: Change) -> Self {
        let name = match &change {
            Change::Create { entity_data } => entity_data.display_name(),
            Change::Update {
                new_state,
                previous_state,
            } => new_state
                .display_name()
                .or_else(|| previous_state.display_name()),
            Change::Delete { deleted_entity } => deleted_entity.display_name(),
        };
        let subject = match name {
            Some(name) => format!("\"{name}\""),
            None => format!("#{entity_id}"),
        };
        Self {
            id: None,
            timestamp: None,
            entity_type: kind,
            entity_id,
            description: format!("{} {} {subject}", change.verb(), kind.noun()),
            change,
        }
    }
}

impl From<Action> for ActionDraft {
    fn from(action: Action) -> Self {
        Self {
            id: Some(action.id),
            timestamp: Some(action.timestamp),
            entity_type: action.entity_type,
            entity_id: action.entity_id,
            description: action.description,
            change: action.change,
        }
    }
}
