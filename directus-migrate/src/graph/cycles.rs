//! Cycle detection (white/gray/black depth-first search)

use std::collections::HashMap;

use super::DependencyGraph;
use super::traversal::{Frame, scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// On the active path
    Gray,
    /// Fully explored
    Black,
}

/// Report every cycle reachable from `entities`, restricted to that subset
///
/// Each cycle is returned closed: its first and last element are the same
/// entity. A node may appear in several cycles when several back-edges reach it.
pub fn detect_cycles(graph: &DependencyGraph, entities: &[String]) -> Vec<Vec<String>> {
    let scope = scope(graph, entities);
    let mut colors: HashMap<&str, Color> = HashMap::new();
    let mut cycles = Vec::new();

    for root in entities {
        let root = root.as_str();
        if !scope.contains(root) || colors.contains_key(root) {
            continue;
        }

        colors.insert(root, Color::Gray);
        let mut path: Vec<&str> = vec![root];
        let mut stack = vec![Frame::new(graph, root, &scope)];

        while let Some(frame) = stack.last_mut() {
            let Some(next) = frame.next_prerequisite() else {
                colors.insert(frame.name, Color::Black);
                path.pop();
                stack.pop();
                continue;
            };

            match colors.get(next).copied() {
                None => {
                    colors.insert(next, Color::Gray);
                    path.push(next);
                    stack.push(Frame::new(graph, next, &scope));
                }
                Some(Color::Gray) => {
                    if let Some(start) = path.iter().position(|n| *n == next) {
                        let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                        cycle.push(next.to_string());
                        cycles.push(cycle);
                    }
                }
                Some(Color::Black) => {}
            }
        }
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let entities = names(&["a", "b", "c"]);
        let graph = DependencyGraph::from_edges(&entities, &[Edge::new("a", "b"), Edge::new("b", "c")]);

        assert!(detect_cycles(&graph, &entities).is_empty());
    }

    #[test]
    fn test_three_node_cycle_reported_once() {
        let entities = names(&["a", "b", "c"]);
        let graph = DependencyGraph::from_edges(
            &entities,
            &[Edge::new("a", "b"), Edge::new("b", "c"), Edge::new("c", "a")],
        );

        let cycles = detect_cycles(&graph, &entities);

        assert_eq!(cycles, vec![names(&["a", "b", "c", "a"])]);
    }

    #[test]
    fn test_multiple_back_edges_share_node() {
        let entities = names(&["a", "b", "c"]);
        let graph = DependencyGraph::from_edges(
            &entities,
            &[
                Edge::new("a", "b"),
                Edge::new("b", "a"),
                Edge::new("b", "c"),
                Edge::new("c", "a"),
            ],
        );

        let cycles = detect_cycles(&graph, &entities);

        assert_eq!(cycles.len(), 2);
        assert!(cycles.iter().all(|c| c.first() == c.last()));
        assert!(cycles.iter().all(|c| c.contains(&"a".to_string())));
    }

    #[test]
    fn test_cycle_outside_subset_ignored() {
        let all = names(&["a", "b", "c"]);
        let graph = DependencyGraph::from_edges(&all, &[Edge::new("b", "c"), Edge::new("c", "b"), Edge::new("a", "b")]);

        assert!(detect_cycles(&graph, &names(&["a", "b"])).is_empty());
        assert_eq!(detect_cycles(&graph, &all).len(), 1);
    }
}
