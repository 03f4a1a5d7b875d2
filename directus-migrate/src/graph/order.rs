//! Migration order analysis

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::DependencyGraph;
use super::batches::wavefront_batches;
use super::cycles::detect_cycles;
use super::levels::assign_levels;
use super::topo::topological_order;

/// Result of analysing a selection of entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationOrder {
    /// Processing order, prerequisites first
    pub order: Vec<String>,
    /// Every detected cycle, closed (first == last)
    pub cycles: Vec<Vec<String>>,
    /// Non-fatal consistency warnings
    pub warnings: Vec<String>,
    /// Entities grouped by level
    pub levels: BTreeMap<u32, Vec<String>>,
    /// The analysed graph, annotated with levels
    pub dependencies: DependencyGraph,
}

impl MigrationOrder {
    /// Wavefront batches over the computed order
    pub fn batches(&self) -> Vec<Vec<String>> {
        wavefront_batches(&self.dependencies, &self.order)
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    pub fn level_of(&self, name: &str) -> Option<u32> {
        if !self.order.iter().any(|n| n == name) {
            return None;
        }
        self.dependencies.get(name).map(|n| n.level)
    }
}

/// Analyse `selected` entities of `graph`
///
/// Cycles and references leaving the selection end up in `warnings`; the
/// analysis itself never fails.
pub fn order(graph: &DependencyGraph, selected: &[String]) -> MigrationOrder {
    let mut warnings = Vec::new();

    for name in selected {
        if !graph.contains(name) {
            warnings.push(format!("{} is not part of the dependency graph and was ignored", name));
        }
    }

    for reference in graph.external_references() {
        if selected.contains(&reference.dependent) {
            warnings.push(reference.warning());
        }
    }

    for name in selected {
        for prerequisite in graph.prerequisites(name) {
            if !selected.contains(prerequisite) {
                warnings.push(format!(
                    "{} depends on {} which is not selected: ensure it already exists in the target",
                    name, prerequisite
                ));
            }
        }
    }

    let cycles = detect_cycles(graph, selected);
    for cycle in &cycles {
        warnings.push(format!(
            "Circular dependency detected: {}; the order cannot satisfy every edge of this cycle",
            cycle.join(" -> ")
        ));
    }

    let order = topological_order(graph, selected);
    let mut dependencies = graph.clone();
    let levels = assign_levels(&mut dependencies, &order);

    for warning in &warnings {
        log::warn!("{}", warning);
    }

    MigrationOrder {
        order,
        cycles,
        warnings,
        levels,
        dependencies,
    }
}

/// Analyse every entity of the graph
pub fn order_all(graph: &DependencyGraph) -> MigrationOrder {
    order(graph, graph.names())
}
