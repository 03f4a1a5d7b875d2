//! Source → target identifier mapping built from successful transfers

use std::collections::HashMap;

use super::entity::EntityType;

/// Maps source identifiers to the identifiers they received in the target
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    map: HashMap<EntityType, HashMap<String, String>>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity_type: EntityType, source_id: impl Into<String>, target_id: impl Into<String>) {
        self.map
            .entry(entity_type)
            .or_default()
            .insert(source_id.into(), target_id.into());
    }

    /// Target id of a record migrated during this run
    pub fn resolve(&self, entity_type: EntityType, source_id: &str) -> Option<&str> {
        self.map
            .get(&entity_type)
            .and_then(|ids| ids.get(source_id))
            .map(|id| id.as_str())
    }

    pub fn len(&self, entity_type: EntityType) -> usize {
        self.map.get(&entity_type).map_or(0, |ids| ids.len())
    }
}
