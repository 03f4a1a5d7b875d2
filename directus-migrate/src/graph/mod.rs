//! Dependency analysis for migrations
//!
//! This module provides functions to:
//! - Normalize raw relations into dependency edges
//! - Build a dependency graph over entity names
//! - Detect cycles and compute a tolerant topological order
//! - Assign levels and group entities into wavefront batches
//! - Validate user-supplied orders

pub mod batches;
pub mod cycles;
pub mod dependency_graph;
pub mod levels;
pub mod order;
pub mod relations;
pub mod schema;
pub mod topo;
pub mod validate;

mod traversal;

pub use batches::wavefront_batches;
pub use cycles::detect_cycles;
pub use dependency_graph::{DEFAULT_RESERVED_PREFIX, DependencyGraph, EntityNode, GraphOptions};
pub use levels::{assign_levels, compute_levels};
pub use order::{MigrationOrder, order, order_all};
pub use relations::{Edge, ExternalReference, NormalizedRelations, RelationDescriptor, RelationKind, normalize_relations};
pub use schema::SchemaSnapshot;
pub use topo::topological_order;
pub use validate::{OrderValidation, validate_custom_order};
