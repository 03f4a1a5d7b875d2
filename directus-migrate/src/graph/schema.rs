//! Schema snapshots: collections and relations read from an instance

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::Record;

use super::{DependencyGraph, GraphOptions, RelationDescriptor};

/// Collection names and relations of one instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub collections: Vec<String>,
    pub relations: Vec<RelationDescriptor>,
    /// Relations that could not be turned into descriptors
    #[serde(default, skip_serializing)]
    pub skipped: Vec<String>,
}

impl SchemaSnapshot {
    /// Convert raw `collections` and `relations` records
    ///
    /// Folder-only collections (no database table) are not entities.
    /// Relations without a single related collection (polymorphic) are skipped.
    pub fn from_records(collections: &[Record], relations: &[Record]) -> Self {
        let mut snapshot = SchemaSnapshot::default();

        for record in collections {
            let Some(name) = record.get("collection").and_then(Value::as_str) else {
                continue;
            };
            if record.get("schema").is_some_and(Value::is_null) {
                log::debug!("Skipping folder collection {}", name);
                continue;
            }
            snapshot.collections.push(name.to_string());
        }

        for record in relations {
            let from = record.get("collection").and_then(Value::as_str);
            let field = record.get("field").and_then(Value::as_str);
            let to = record.get("related_collection").and_then(Value::as_str);

            match (from, to) {
                (Some(from), Some(to)) => {
                    let mut relation = RelationDescriptor::many_to_one(from, to);
                    if let Some(field) = field {
                        relation = relation.with_field(field);
                    }
                    snapshot.relations.push(relation);
                }
                (Some(from), None) => {
                    let skipped = format!(
                        "{}.{} has no single related collection and was skipped",
                        from,
                        field.unwrap_or("?")
                    );
                    log::warn!("{}", skipped);
                    snapshot.skipped.push(skipped);
                }
                _ => {}
            }
        }

        snapshot
    }

    /// Build the dependency graph of this schema
    pub fn graph(&self, options: &GraphOptions) -> DependencyGraph {
        DependencyGraph::build(&self.collections, &self.relations, options)
    }
}
