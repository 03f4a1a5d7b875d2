//! Dependency graph construction
//!
//! Nodes are entity names; every retained edge is stored on both ends
//! (`depends_on` on the dependent, `depended_by` on the prerequisite).
//! Neighbour lists keep the order in which relations were first seen so
//! that every traversal over the graph is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::traversal::Scope;
use super::relations::{Edge, ExternalReference, RelationDescriptor, is_reserved, normalize_relations};

/// Default namespace of platform-internal collections
pub const DEFAULT_RESERVED_PREFIX: &str = "directus_";

/// Options controlling graph construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphOptions {
    /// Collections starting with this prefix are treated as system collections
    pub reserved_prefix: String,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            reserved_prefix: DEFAULT_RESERVED_PREFIX.to_string(),
        }
    }
}

/// A single entity in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityNode {
    pub name: String,
    /// Entities that must exist before this one
    pub depends_on: Vec<String>,
    /// Entities that reference this one
    pub depended_by: Vec<String>,
    /// Longest prerequisite chain below this entity (set by level assignment)
    pub level: u32,
}

impl EntityNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            depends_on: Vec::new(),
            depended_by: Vec::new(),
            level: 0,
        }
    }
}

/// Dependency graph for a set of entities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// Entity names in the order they were supplied
    names: Vec<String>,
    /// Keyed by name so serialized output is stable
    nodes: BTreeMap<String, EntityNode>,
    /// References that left the graph and were reported instead of added
    external: Vec<ExternalReference>,
}

impl DependencyGraph {
    /// Build a dependency graph from entity names and raw relations
    pub fn build(entities: &[String], relations: &[RelationDescriptor], options: &GraphOptions) -> Self {
        let kept: Vec<String> = entities
            .iter()
            .filter(|e| !is_reserved(e, &options.reserved_prefix))
            .cloned()
            .collect();

        let normalized = normalize_relations(&kept, relations, &options.reserved_prefix);
        let mut graph = Self::from_edges(&kept, &normalized.edges);
        graph.external = normalized.external;
        graph
    }

    /// Build a graph directly from already normalized edges
    ///
    /// Edges whose endpoints are not in `entities` and self edges are ignored.
    pub fn from_edges(entities: &[String], edges: &[Edge]) -> Self {
        let mut graph = DependencyGraph::default();

        for name in entities {
            if graph.nodes.contains_key(name) {
                continue;
            }
            graph.names.push(name.clone());
            graph.nodes.insert(name.clone(), EntityNode::new(name));
        }

        for edge in edges {
            if edge.is_self_reference()
                || !graph.nodes.contains_key(&edge.dependent)
                || !graph.nodes.contains_key(&edge.prerequisite)
            {
                continue;
            }
            graph.add_edge(&edge.dependent, &edge.prerequisite);
        }

        graph
    }

    fn add_edge(&mut self, dependent: &str, prerequisite: &str) {
        if let Some(node) = self.nodes.get_mut(dependent) {
            if node.depends_on.iter().any(|d| d == prerequisite) {
                return;
            }
            node.depends_on.push(prerequisite.to_string());
        }
        if let Some(node) = self.nodes.get_mut(prerequisite) {
            node.depended_by.push(dependent.to_string());
        }
    }

    /// Entity names in insertion order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, name: &str) -> Option<&EntityNode> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &EntityNode> {
        self.names.iter().filter_map(|n| self.nodes.get(n))
    }

    /// Direct prerequisites of an entity (empty for unknown entities)
    pub fn prerequisites(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.depends_on.as_slice())
            .unwrap_or(&[])
    }

    /// Direct dependents of an entity (empty for unknown entities)
    pub fn dependents(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.depended_by.as_slice())
            .unwrap_or(&[])
    }

    /// Prerequisites of `name` restricted to `scope`, in supplied-list order
    pub(crate) fn scoped_prerequisites<'a>(&'a self, name: &str, scope: &Scope<'_>) -> Vec<&'a str> {
        let mut prerequisites: Vec<&str> = self
            .prerequisites(name)
            .iter()
            .map(|p| p.as_str())
            .filter(|p| scope.contains(*p))
            .collect();
        prerequisites.sort_by_key(|p| scope.position(p));
        prerequisites
    }

    /// References that were not added as edges
    pub fn external_references(&self) -> &[ExternalReference] {
        &self.external
    }

    pub(crate) fn set_level(&mut self, name: &str, level: u32) {
        if let Some(node) = self.nodes.get_mut(name) {
            node.level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_links_both_directions() {
        let graph = DependencyGraph::build(
            &names(&["orders", "customers"]),
            &[RelationDescriptor::many_to_one("orders", "customers")],
            &GraphOptions::default(),
        );

        assert_eq!(graph.prerequisites("orders"), &["customers".to_string()]);
        assert_eq!(graph.dependents("customers"), &["orders".to_string()]);
        assert!(graph.prerequisites("customers").is_empty());
    }

    #[test]
    fn test_system_collections_excluded_from_nodes() {
        let graph = DependencyGraph::build(
            &names(&["articles", "directus_users"]),
            &[RelationDescriptor::many_to_one("articles", "directus_users").with_field("author")],
            &GraphOptions::default(),
        );

        assert!(graph.contains("articles"));
        assert!(!graph.contains("directus_users"));
        assert!(graph.prerequisites("articles").is_empty());
        assert_eq!(graph.external_references().len(), 1);
    }

    #[test]
    fn test_serialized_nodes_are_stable() {
        let entities = names(&["zeta", "alpha", "mid", "beta"]);
        let graph = DependencyGraph::from_edges(&entities, &[Edge::new("zeta", "alpha")]);

        let json = serde_json::to_value(&graph).unwrap();
        let keys: Vec<&String> = json["nodes"].as_object().unwrap().keys().collect();

        assert_eq!(keys, vec!["alpha", "beta", "mid", "zeta"]);
    }

    #[test]
    fn test_self_reference_ignored() {
        let graph = DependencyGraph::build(
            &names(&["folders"]),
            &[RelationDescriptor::many_to_one("folders", "folders").with_field("parent")],
            &GraphOptions::default(),
        );

        assert!(graph.prerequisites("folders").is_empty());
        assert!(graph.dependents("folders").is_empty());
    }

    #[test]
    fn test_duplicate_names_collapse() {
        let graph = DependencyGraph::from_edges(&names(&["a", "b", "a"]), &[Edge::new("a", "b"), Edge::new("a", "b")]);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.prerequisites("a").len(), 1);
        assert_eq!(graph.dependents("b").len(), 1);
    }

    #[test]
    fn test_edges_to_unknown_nodes_ignored() {
        let graph = DependencyGraph::from_edges(&names(&["a"]), &[Edge::new("a", "ghost")]);
        assert!(graph.prerequisites("a").is_empty());
    }
}
