//! What to migrate and how

use std::collections::{BTreeSet, HashMap};

use crate::api::Filter;
use crate::transfer::{EntityType, ExecutionMode, TransferOptions};

/// Entity types requested for a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSelection {
    types: BTreeSet<EntityType>,
}

impl MigrationSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every known entity type
    pub fn all() -> Self {
        Self::from_types(EntityType::all().iter().copied())
    }

    pub fn from_types(types: impl IntoIterator<Item = EntityType>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    pub fn with(mut self, entity_type: EntityType) -> Self {
        self.types.insert(entity_type);
        self
    }

    pub fn contains(&self, entity_type: EntityType) -> bool {
        self.types.contains(&entity_type)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Selected types in declaration order
    pub fn types(&self) -> Vec<EntityType> {
        self.types.iter().copied().collect()
    }
}

/// Options for one run
#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    /// Transfer switches applied to every type without an override
    pub defaults: TransferOptions,
    /// Per-type transfer switches
    pub overrides: HashMap<EntityType, TransferOptions>,
    /// Ordering of records within self-referencing types
    pub mode: ExecutionMode,
    /// User-chosen processing order of the selected types
    pub type_order: Option<Vec<EntityType>>,
    /// Source-side filters per type
    pub filters: HashMap<EntityType, Filter>,
}

impl MigrationOptions {
    pub fn transfer_options(&self, entity_type: EntityType) -> TransferOptions {
        self.overrides.get(&entity_type).copied().unwrap_or(self.defaults)
    }

    pub fn with_override(mut self, entity_type: EntityType, options: TransferOptions) -> Self {
        self.overrides.insert(entity_type, options);
        self
    }

    pub fn with_filter(mut self, entity_type: EntityType, filter: Filter) -> Self {
        self.filters.insert(entity_type, filter);
        self
    }
}
