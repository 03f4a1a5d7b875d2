//! Wavefront batching
//!
//! Groups an ordered working set into batches whose members only depend on
//! entities from strictly earlier batches. Members of one batch have no
//! ordering constraint on each other.

use std::collections::HashSet;

use super::DependencyGraph;
use super::traversal::scope;

/// Split `order` into wavefront batches
///
/// When a scan places nothing (only remaining cycle members are left), every
/// remaining entity is flushed into one final batch.
pub fn wavefront_batches(graph: &DependencyGraph, order: &[String]) -> Vec<Vec<String>> {
    let scope = scope(graph, order);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut remaining: Vec<&str> = order
        .iter()
        .map(|e| e.as_str())
        .filter(|e| scope.contains(*e) && seen.insert(*e))
        .collect();

    let mut placed: HashSet<&str> = HashSet::new();
    let mut batches = Vec::new();

    while !remaining.is_empty() {
        let batch: Vec<&str> = remaining
            .iter()
            .copied()
            .filter(|name| {
                graph
                    .scoped_prerequisites(name, &scope)
                    .iter()
                    .all(|p| placed.contains(p))
            })
            .collect();

        if batch.is_empty() {
            log::warn!(
                "Unresolved dependency cycle, flushing {} entities into a final batch: {}",
                remaining.len(),
                remaining.join(", ")
            );
            batches.push(remaining.iter().map(|n| n.to_string()).collect());
            break;
        }

        placed.extend(batch.iter().copied());
        remaining.retain(|name| !placed.contains(name));
        batches.push(batch.into_iter().map(|n| n.to_string()).collect());
    }

    batches
}
