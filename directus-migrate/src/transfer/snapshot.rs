//! Target snapshots: existing records read once per run

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::api::{Record, record_id};

use super::entity::EntityType;

/// Separator between natural-key components
const KEY_SEPARATOR: char = '\u{1f}';

/// Build the natural key of a record, `None` when every key field is empty
pub fn natural_key(entity_type: EntityType, record: &Record) -> Option<String> {
    let parts: Vec<String> = entity_type
        .natural_key()
        .iter()
        .map(|field| match record.get(*field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(value) => crate::api::id_string(value).unwrap_or_else(|| value.to_string()),
        })
        .collect();

    if parts.iter().all(|p| p.is_empty()) {
        return None;
    }
    Some(parts.join(&KEY_SEPARATOR.to_string()))
}

/// Existing records of one entity type in the target
#[derive(Debug, Clone)]
pub struct TargetSnapshot {
    entity_type: EntityType,
    records: Vec<Record>,
    by_id: HashMap<String, usize>,
    by_natural_key: HashMap<String, usize>,
}

impl TargetSnapshot {
    pub fn new(entity_type: EntityType, records: Vec<Record>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_natural_key = HashMap::new();

        for (index, record) in records.iter().enumerate() {
            if let Some(id) = record_id(record, entity_type.id_field()) {
                by_id.insert(id, index);
            }
            if let Some(key) = natural_key(entity_type, record) {
                by_natural_key.entry(key).or_insert(index);
            }
        }

        Self {
            entity_type,
            records,
            by_id,
            by_natural_key,
        }
    }

    pub fn empty(entity_type: EntityType) -> Self {
        Self::new(entity_type, Vec::new())
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Record> {
        self.by_id.get(id).map(|&i| &self.records[i])
    }

    /// First record sharing the natural key of `record`
    pub fn find_by_natural_key(&self, record: &Record) -> Option<&Record> {
        let key = natural_key(self.entity_type, record)?;
        self.by_natural_key.get(&key).map(|&i| &self.records[i])
    }
}

/// Snapshots of every type a run touches plus ids of external collections
#[derive(Debug, Clone, Default)]
pub struct SnapshotSet {
    snapshots: HashMap<EntityType, TargetSnapshot>,
    external: HashMap<String, HashSet<String>>,
}

impl SnapshotSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, snapshot: TargetSnapshot) {
        self.snapshots.insert(snapshot.entity_type(), snapshot);
    }

    /// Register the known ids of a collection that is never migrated
    pub fn insert_external(&mut self, collection: &str, ids: impl IntoIterator<Item = String>) {
        self.external
            .entry(collection.to_string())
            .or_default()
            .extend(ids);
    }

    pub fn get(&self, entity_type: EntityType) -> Option<&TargetSnapshot> {
        self.snapshots.get(&entity_type)
    }

    pub fn contains_id(&self, entity_type: EntityType, id: &str) -> bool {
        self.get(entity_type).is_some_and(|s| s.contains_id(id))
    }

    pub fn contains_external(&self, collection: &str, id: &str) -> bool {
        self.external.get(collection).is_some_and(|ids| ids.contains(id))
    }
}
