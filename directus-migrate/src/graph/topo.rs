//! Topological ordering (post-order depth-first search)

use std::collections::HashMap;

use super::DependencyGraph;
use super::traversal::{Frame, scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Order `entities` so that prerequisites come before their dependents
///
/// Cycles do not fail the sort: a prerequisite that is still in progress is
/// treated as satisfied, so the result is total and deterministic but breaks
/// one edge of every cycle. Unconstrained entities keep the relative order in
/// which they appear in `entities`.
pub fn topological_order(graph: &DependencyGraph, entities: &[String]) -> Vec<String> {
    let scope = scope(graph, entities);
    let mut visits: HashMap<&str, Visit> = HashMap::new();
    let mut order = Vec::with_capacity(scope.len());

    for root in entities {
        let root = root.as_str();
        if !scope.contains(root) || visits.contains_key(root) {
            continue;
        }

        visits.insert(root, Visit::InProgress);
        let mut stack = vec![Frame::new(graph, root, &scope)];

        while let Some(frame) = stack.last_mut() {
            let name = frame.name;
            match frame.next_prerequisite() {
                Some(prerequisite) => match visits.get(prerequisite).copied() {
                    None => {
                        visits.insert(prerequisite, Visit::InProgress);
                        stack.push(Frame::new(graph, prerequisite, &scope));
                    }
                    Some(Visit::InProgress) => {
                        log::debug!("{} -> {} closes a cycle, treating it as satisfied", name, prerequisite);
                    }
                    Some(Visit::Done) => {}
                },
                None => {
                    stack.pop();
                    visits.insert(name, Visit::Done);
                    order.push(name.to_string());
                }
            }
        }
    }

    order
}
