//! Per-call traversal state shared by the graph passes
//!
//! Every pass owns its own stack of frames and visit markers, so analyses
//! never share mutable state and can run concurrently on the same graph.

use std::collections::HashMap;

use super::DependencyGraph;

/// Working set of one pass: names from the supplied list that exist in the
/// graph, with the position of their first occurrence
pub(crate) struct Scope<'a> {
    positions: HashMap<&'a str, usize>,
}

impl Scope<'_> {
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Position in the supplied list; names outside the scope sort last
    pub fn position(&self, name: &str) -> usize {
        self.positions.get(name).copied().unwrap_or(usize::MAX)
    }
}

/// Names from `entities` that exist in the graph
pub(crate) fn scope<'a>(graph: &DependencyGraph, entities: &'a [String]) -> Scope<'a> {
    let mut positions = HashMap::new();
    for (index, name) in entities.iter().enumerate() {
        if graph.contains(name) {
            positions.entry(name.as_str()).or_insert(index);
        }
    }
    Scope { positions }
}

/// One entry of an explicit depth-first stack
pub(crate) struct Frame<'a> {
    pub name: &'a str,
    prerequisites: Vec<&'a str>,
    next: usize,
}

impl<'a> Frame<'a> {
    pub fn new(graph: &'a DependencyGraph, name: &'a str, scope: &Scope<'_>) -> Self {
        Self {
            name,
            prerequisites: graph.scoped_prerequisites(name, scope),
            next: 0,
        }
    }

    /// Advance to the next unexplored prerequisite
    pub fn next_prerequisite(&mut self) -> Option<&'a str> {
        let next = self.prerequisites.get(self.next).copied();
        if next.is_some() {
            self.next += 1;
        }
        next
    }
}
