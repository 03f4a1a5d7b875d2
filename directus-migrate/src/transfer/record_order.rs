//! Ordering of records that reference records of their own type
//!
//! Folders point at their parent folder, so a child can only be written once
//! its parent exists in the target. The record-level graph reuses the same
//! engine as the type-level one, keyed by record id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::api::{Record, id_string, record_id};
use crate::graph::{self, DependencyGraph, Edge};

use super::entity::{EntityType, RefTarget};

/// How records of a self-referencing type are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Depth-first order, every record right after its ancestors
    #[default]
    Sequential,
    /// Level by level: all roots, then their children, and so on
    LevelBatched,
}

/// Order `records` so that referenced records of the same type come first
///
/// Types without self references keep their source order. References to
/// records outside the set are ignored here and handled by the transfer
/// engine. Records without an identifier are placed first.
pub fn order_records(entity_type: EntityType, records: Vec<Record>, mode: ExecutionMode) -> Vec<Record> {
    if !entity_type.is_self_referencing() {
        return records;
    }

    let id_field = entity_type.id_field();
    let self_fields: Vec<&str> = entity_type
        .references()
        .iter()
        .filter(|r| r.target == RefTarget::Entity(entity_type))
        .map(|r| r.field)
        .collect();

    let mut ordered = Vec::with_capacity(records.len());
    let mut ids: Vec<String> = Vec::new();
    let mut edges: Vec<Edge> = Vec::new();
    let mut by_id: HashMap<String, Vec<Record>> = HashMap::new();

    for record in records {
        let Some(id) = record_id(&record, id_field) else {
            ordered.push(record);
            continue;
        };
        for field in &self_fields {
            if let Some(parent) = record.get(*field).and_then(id_string) {
                edges.push(Edge::new(id.clone(), parent));
            }
        }
        if !by_id.contains_key(&id) {
            ids.push(id.clone());
        }
        by_id.entry(id).or_default().push(record);
    }

    let graph = DependencyGraph::from_edges(&ids, &edges);
    let sequence = match mode {
        ExecutionMode::Sequential => graph::topological_order(&graph, &ids),
        ExecutionMode::LevelBatched => {
            let order = graph::topological_order(&graph, &ids);
            let batches = graph::wavefront_batches(&graph, &order);
            log::debug!("{}: {} records in {} levels", entity_type, ids.len(), batches.len());
            batches.into_iter().flatten().collect()
        }
    };

    for id in sequence {
        if let Some(group) = by_id.remove(&id) {
            ordered.extend(group);
        }
    }
    ordered
}
