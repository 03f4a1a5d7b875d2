//! Relation descriptors and their normalization into dependency edges

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Direction of a reference between two collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// `from` holds a foreign key to `to` (the "many" side references the "one" side)
    ManyToOne,
    /// `to` holds a foreign key to `from`
    OneToMany,
}

/// A raw relationship between two collections as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    pub from: String,
    pub to: String,
    /// Field carrying the reference, when known (e.g., "customer_id")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub kind: RelationKind,
}

impl RelationDescriptor {
    pub fn many_to_one(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            field: None,
            kind: RelationKind::ManyToOne,
        }
    }

    pub fn one_to_many(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            field: None,
            kind: RelationKind::OneToMany,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Resolve the dependency direction of this relation
    pub fn edge(&self) -> Edge {
        match self.kind {
            RelationKind::ManyToOne => Edge::new(&self.from, &self.to),
            RelationKind::OneToMany => Edge::new(&self.to, &self.from),
        }
    }
}

/// A directed dependency: `dependent` cannot be created before `prerequisite`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub dependent: String,
    pub prerequisite: String,
}

impl Edge {
    pub fn new(dependent: impl Into<String>, prerequisite: impl Into<String>) -> Self {
        Self {
            dependent: dependent.into(),
            prerequisite: prerequisite.into(),
        }
    }

    pub fn is_self_reference(&self) -> bool {
        self.dependent == self.prerequisite
    }
}

/// A reference that leaves the graph (system collection or collection outside the entity set)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalReference {
    pub dependent: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Whether the target lives in the reserved system namespace
    pub system: bool,
}

impl ExternalReference {
    pub fn warning(&self) -> String {
        let via = self
            .field
            .as_deref()
            .map(|f| format!(" (via {})", f))
            .unwrap_or_default();
        if self.system {
            format!(
                "{} references system collection {}{}: external reference, ensure identifier mapping",
                self.dependent, self.target, via
            )
        } else {
            format!(
                "{} references {}{} which is not part of the entity set: external reference, ensure identifier mapping",
                self.dependent, self.target, via
            )
        }
    }
}

/// Edges kept for the graph plus references that degraded to warnings
#[derive(Debug, Clone, Default)]
pub struct NormalizedRelations {
    pub edges: Vec<Edge>,
    pub external: Vec<ExternalReference>,
}

/// Check whether a collection belongs to the reserved system namespace
pub fn is_reserved(name: &str, reserved_prefix: &str) -> bool {
    !reserved_prefix.is_empty() && name.starts_with(reserved_prefix)
}

/// Filter raw relations down to inter-entity edges
///
/// - Relations whose dependent side is a system collection are dropped
/// - Relations pointing at a system collection or a collection outside `entities`
///   become external references instead of edges
/// - Self-references and duplicate edges are dropped
pub fn normalize_relations(
    entities: &[String],
    relations: &[RelationDescriptor],
    reserved_prefix: &str,
) -> NormalizedRelations {
    let known: HashSet<&str> = entities
        .iter()
        .map(|e| e.as_str())
        .filter(|e| !is_reserved(e, reserved_prefix))
        .collect();

    let mut seen: HashSet<Edge> = HashSet::new();
    let mut normalized = NormalizedRelations::default();

    for relation in relations {
        let edge = relation.edge();

        if edge.is_self_reference() {
            continue;
        }
        if is_reserved(&edge.dependent, reserved_prefix) || !known.contains(edge.dependent.as_str()) {
            continue;
        }

        let system = is_reserved(&edge.prerequisite, reserved_prefix);
        if system || !known.contains(edge.prerequisite.as_str()) {
            let external = ExternalReference {
                dependent: edge.dependent,
                target: edge.prerequisite,
                field: relation.field.clone(),
                system,
            };
            if !normalized.external.contains(&external) {
                normalized.external.push(external);
            }
            continue;
        }

        if seen.insert(edge.clone()) {
            normalized.edges.push(edge);
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_many_to_one_makes_many_side_dependent() {
        let edge = RelationDescriptor::many_to_one("orders", "customers").edge();
        assert_eq!(edge, Edge::new("orders", "customers"));
    }

    #[test]
    fn test_one_to_many_reverses_direction() {
        let edge = RelationDescriptor::one_to_many("customers", "orders").edge();
        assert_eq!(edge, Edge::new("orders", "customers"));
    }

    #[test]
    fn test_system_reference_becomes_warning() {
        let relations = vec![
            RelationDescriptor::many_to_one("articles", "directus_users").with_field("author"),
        ];

        let normalized = normalize_relations(&names(&["articles"]), &relations, "directus_");

        assert!(normalized.edges.is_empty());
        assert_eq!(normalized.external.len(), 1);
        assert!(normalized.external[0].system);
        assert!(normalized.external[0].warning().contains("ensure identifier mapping"));
        assert!(normalized.external[0].warning().contains("via author"));
    }

    #[test]
    fn test_system_dependent_is_dropped_silently() {
        let relations = vec![RelationDescriptor::many_to_one("directus_files", "articles")];

        let normalized = normalize_relations(&names(&["articles", "directus_files"]), &relations, "directus_");

        assert!(normalized.edges.is_empty());
        assert!(normalized.external.is_empty());
    }

    #[test]
    fn test_self_reference_and_duplicates_dropped() {
        let relations = vec![
            RelationDescriptor::many_to_one("categories", "categories").with_field("parent"),
            RelationDescriptor::many_to_one("articles", "categories").with_field("category"),
            RelationDescriptor::one_to_many("categories", "articles"),
        ];

        let normalized = normalize_relations(&names(&["articles", "categories"]), &relations, "directus_");

        assert_eq!(normalized.edges, vec![Edge::new("articles", "categories")]);
    }

    #[test]
    fn test_empty_prefix_reserves_nothing() {
        assert!(!is_reserved("directus_users", ""));
        assert!(is_reserved("directus_users", "directus_"));
    }
}
