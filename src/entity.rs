//! Entity snapshots captured before and after mutations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::EntityId;

/// Field holding a record's identifier.
pub const ID_FIELD: &str = "id";
/// Foreign key from an item to its parent folder.
pub const FOLDER_ID_FIELD: &str = "folder_id";
/// Fields assigned by the repository on create; never sent back on recreation.
pub const GENERATED_FIELDS: [&str; 3] = [ID_FIELD, "created_at", "updated_at"];

/// Captured copy of an entity's fields at a point in time.
///
/// The journal does not know the host's record layout, so a snapshot is a
/// JSON object. Only [`ID_FIELD`], [`FOLDER_ID_FIELD`] and the display name
/// fields carry meaning here.
///
/// Used as a patch, a `null` value means "field absent": applying it removes
/// the field from the record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Map<String, Value>);

impl Snapshot {
    /// Empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON value; returns `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Sets one field in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns a field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrows the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Record identifier, when present and numeric.
    pub fn id(&self) -> Option<EntityId> {
        self.0.get(ID_FIELD).and_then(Value::as_u64)
    }

    /// Copy of this snapshot carrying `id`.
    pub fn with_id(&self, id: EntityId) -> Self {
        self.clone().with(ID_FIELD, id)
    }

    /// Parent folder of an item snapshot.
    pub fn folder_id(&self) -> Option<EntityId> {
        self.0.get(FOLDER_ID_FIELD).and_then(Value::as_u64)
    }

    /// Human-facing name, preferring `name` over `title`.
    pub fn display_name(&self) -> Option<&str> {
        ["name", "title"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str))
            .filter(|name| !name.is_empty())
    }

    /// Copy with [`GENERATED_FIELDS`] removed, ready for a create call.
    pub fn without_generated_fields(&self) -> Self {
        let mut out = self.clone();
        for field in GENERATED_FIELDS {
            out.0.remove(field);
        }
        out
    }

    /// Captures an inverse patch for every field present in `self`.
    ///
    /// Fields missing from `current` are captured as `null`, so applying the
    /// inverse removes them again.
    pub fn capture_inverse_for(&self, current: &Snapshot) -> Self {
        let map = self
            .0
            .keys()
            .map(|key| (key.clone(), current.0.get(key).cloned().unwrap_or(Value::Null)))
            .collect();
        Self(map)
    }

    /// Applies this snapshot as a sparse patch over `record`.
    pub fn apply_to(&self, record: &mut Snapshot) {
        for (key, value) in &self.0 {
            if value.is_null() {
                record.0.remove(key);
            } else {
                record.0.insert(key.clone(), value.clone());
            }
        }
    }

    /// Points `field` at `new` if it currently holds `old`.
    pub fn replace_ref(&mut self, field: &str, old: EntityId, new: EntityId) {
        if self.0.get(field).and_then(Value::as_u64) == Some(old) {
            self.0.insert(field.to_owned(), Value::from(new));
        }
    }
}

impl From<Map<String, Value>> for Snapshot {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snap(value: Value) -> Snapshot {
        Snapshot::from_value(value).expect("object")
    }

    #[test]
    fn strips_generated_fields_only() {
        let s = snap(json!({
            "id": 9,
            "folder_id": 55,
            "name": "scan.pdf",
            "created_at": 1,
            "updated_at": 2,
        }));
        let stripped = s.without_generated_fields();
        assert_eq!(stripped, snap(json!({"folder_id": 55, "name": "scan.pdf"})));
        assert_eq!(s.id(), Some(9));
        assert_eq!(s.folder_id(), Some(55));
    }

    #[test]
    fn inverse_patch_restores_prior_values() {
        let mut record = snap(json!({"id": 3, "name": "Old", "tags": "a"}));
        let before = record.clone();
        let patch = snap(json!({"name": "New", "note": "x"}));

        let inverse = patch.capture_inverse_for(&record);
        assert_eq!(inverse, snap(json!({"name": "Old", "note": null})));

        patch.apply_to(&mut record);
        assert_eq!(record.get("name"), Some(&json!("New")));

        inverse.apply_to(&mut record);
        assert_eq!(record, before);
        assert_eq!(record.get("note"), None);
    }

    #[test]
    fn replace_ref_only_touches_matching_values() {
        let mut s = snap(json!({"id": 4, "folder_id": 1}));
        s.replace_ref(FOLDER_ID_FIELD, 1, 8);
        s.replace_ref(ID_FIELD, 5, 9);
        assert_eq!(s, snap(json!({"id": 4, "folder_id": 8})));
    }

    #[test]
    fn display_name_falls_back_to_title() {
        assert_eq!(snap(json!({"title": "Receipts"})).display_name(), Some("Receipts"));
        assert_eq!(snap(json!({"name": ""})).display_name(), None);
        assert!(Snapshot::from_value(json!([1, 2])).is_none());
    }
}
