//! Migrated entity types and their reference structure

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::Record;
use crate::graph::{self, DependencyGraph, Edge};

/// What a reference field points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTarget {
    /// Another migrated entity type
    Entity(EntityType),
    /// A collection that is never migrated (checked for presence only)
    External(&'static str),
}

/// A foreign reference held by a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub target: RefTarget,
}

const fn entity_ref(field: &'static str, target: EntityType) -> Reference {
    Reference {
        field,
        target: RefTarget::Entity(target),
    }
}

const fn external_ref(field: &'static str, collection: &'static str) -> Reference {
    Reference {
        field,
        target: RefTarget::External(collection),
    }
}

/// A category of migrated records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Role,
    Policy,
    Permission,
    AccessLink,
    Folder,
    File,
}

impl EntityType {
    /// Every type, in declaration order
    pub fn all() -> &'static [EntityType] {
        &[
            EntityType::Role,
            EntityType::Policy,
            EntityType::Permission,
            EntityType::AccessLink,
            EntityType::Folder,
            EntityType::File,
        ]
    }

    /// Collection holding records of this type
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Role => "roles",
            Self::Policy => "policies",
            Self::Permission => "permissions",
            Self::AccessLink => "access",
            Self::Folder => "folders",
            Self::File => "files",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Role => "Role",
            Self::Policy => "Policy",
            Self::Permission => "Permission",
            Self::AccessLink => "Access link",
            Self::Folder => "Folder",
            Self::File => "File",
        }
    }

    pub fn id_field(&self) -> &'static str {
        "id"
    }

    /// Fields identifying a record when identifiers are not preserved
    pub fn natural_key(&self) -> &'static [&'static str] {
        match self {
            Self::Role => &["name"],
            Self::Policy => &["name"],
            Self::Permission => &["policy", "collection", "action"],
            Self::AccessLink => &["role", "user", "policy"],
            Self::Folder => &["name", "parent"],
            Self::File => &["filename_disk"],
        }
    }

    /// Foreign references this type holds
    pub fn references(&self) -> &'static [Reference] {
        const PERMISSION: &[Reference] = &[entity_ref("policy", EntityType::Policy)];
        const ACCESS: &[Reference] = &[
            entity_ref("role", EntityType::Role),
            entity_ref("policy", EntityType::Policy),
            external_ref("user", "users"),
        ];
        const FOLDER: &[Reference] = &[entity_ref("parent", EntityType::Folder)];
        const FILE: &[Reference] = &[entity_ref("folder", EntityType::Folder)];

        match self {
            Self::Role | Self::Policy => &[],
            Self::Permission => PERMISSION,
            Self::AccessLink => ACCESS,
            Self::Folder => FOLDER,
            Self::File => FILE,
        }
    }

    /// Fields the target derives itself: relationship collections owned by
    /// other records, and server-managed upload/modification stamps on files
    pub fn derived_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Role => &["users", "policies", "children"],
            Self::Policy => &["permissions", "roles", "users"],
            Self::Permission | Self::AccessLink | Self::Folder => &[],
            Self::File => &["uploaded_by", "uploaded_on", "modified_by", "modified_on"],
        }
    }

    /// Whether a record grants privileged access
    pub fn is_admin_like(&self, record: &Record) -> bool {
        match self {
            Self::Policy => record.get("admin_access").and_then(Value::as_bool).unwrap_or(false),
            _ => false,
        }
    }

    /// Types this type references (excluding itself)
    pub fn prerequisites(&self) -> Vec<EntityType> {
        let mut prerequisites = Vec::new();
        for reference in self.references() {
            if let RefTarget::Entity(target) = reference.target {
                if target != *self && !prerequisites.contains(&target) {
                    prerequisites.push(target);
                }
            }
        }
        prerequisites
    }

    /// Whether records of this type reference records of the same type
    pub fn is_self_referencing(&self) -> bool {
        self.references()
            .iter()
            .any(|r| r.target == RefTarget::Entity(*self))
    }

    /// Type-level dependency graph over every entity type
    pub fn dependency_graph() -> DependencyGraph {
        let names: Vec<String> = Self::all().iter().map(|t| t.collection().to_string()).collect();
        let edges: Vec<Edge> = Self::all()
            .iter()
            .flat_map(|t| {
                t.prerequisites()
                    .into_iter()
                    .map(move |p| Edge::new(t.collection(), p.collection()))
            })
            .collect();
        DependencyGraph::from_edges(&names, &edges)
    }

    /// Processing order for a selection of types, prerequisites first
    pub fn migration_order(selected: &[EntityType]) -> Vec<EntityType> {
        let graph = Self::dependency_graph();
        let names: Vec<String> = Self::all()
            .iter()
            .filter(|t| selected.contains(t))
            .map(|t| t.collection().to_string())
            .collect();

        graph::topological_order(&graph, &names)
            .iter()
            .filter_map(|name| Self::from_collection(name))
            .collect()
    }

    pub fn from_collection(collection: &str) -> Option<EntityType> {
        Self::all().iter().copied().find(|t| t.collection() == collection)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.collection())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "role" | "roles" => Ok(Self::Role),
            "policy" | "policies" => Ok(Self::Policy),
            "permission" | "permissions" => Ok(Self::Permission),
            "access" | "access_link" | "access_links" => Ok(Self::AccessLink),
            "folder" | "folders" => Ok(Self::Folder),
            "file" | "files" => Ok(Self::File),
            other => Err(format!(
                "Unknown entity type '{}' (expected one of: roles, policies, permissions, access, folders, files)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fixed_order_derived_from_references() {
        assert_eq!(
            EntityType::migration_order(EntityType::all()),
            vec![
                EntityType::Role,
                EntityType::Policy,
                EntityType::Permission,
                EntityType::AccessLink,
                EntityType::Folder,
                EntityType::File,
            ]
        );
    }

    #[test]
    fn test_order_of_subset_ignores_selection_order() {
        assert_eq!(
            EntityType::migration_order(&[EntityType::AccessLink, EntityType::Permission, EntityType::Role]),
            vec![EntityType::Role, EntityType::Permission, EntityType::AccessLink]
        );
    }

    #[test]
    fn test_prerequisites() {
        assert_eq!(EntityType::AccessLink.prerequisites(), vec![EntityType::Role, EntityType::Policy]);
        assert_eq!(EntityType::Permission.prerequisites(), vec![EntityType::Policy]);
        assert!(EntityType::Folder.prerequisites().is_empty());
        assert!(EntityType::Folder.is_self_referencing());
        assert!(!EntityType::File.is_self_referencing());
    }

    #[test]
    fn test_admin_like_policy() {
        let admin = match json!({"id": "p1", "admin_access": true}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert!(EntityType::Policy.is_admin_like(&admin));
        assert!(!EntityType::Role.is_admin_like(&admin));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Policies".parse::<EntityType>(), Ok(EntityType::Policy));
        assert_eq!("access-link".parse::<EntityType>(), Ok(EntityType::AccessLink));
        assert!("widgets".parse::<EntityType>().is_err());
    }
}
