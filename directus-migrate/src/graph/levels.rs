//! Level assignment
//!
//! `level = 0` for entities without prerequisites, otherwise
//! `1 + max(level of prerequisites)`. A prerequisite met again while it is
//! still being computed counts as level 0 for that occurrence only.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::DependencyGraph;
use super::traversal::{Frame, scope};

struct LevelFrame<'a> {
    frame: Frame<'a>,
    /// Highest prerequisite level seen so far, `None` while no prerequisite was seen
    highest: Option<u32>,
}

impl LevelFrame<'_> {
    fn absorb(&mut self, level: u32) {
        self.highest = Some(self.highest.map_or(level, |h| h.max(level)));
    }

    fn level(&self) -> u32 {
        self.highest.map_or(0, |h| h.saturating_add(1))
    }
}

/// Compute levels for `entities` without touching the graph
pub fn compute_levels(graph: &DependencyGraph, entities: &[String]) -> HashMap<String, u32> {
    let scope = scope(graph, entities);
    let mut memo: HashMap<&str, u32> = HashMap::new();
    let mut in_progress: HashSet<&str> = HashSet::new();

    for root in entities {
        let root = root.as_str();
        if !scope.contains(root) || memo.contains_key(root) {
            continue;
        }

        in_progress.insert(root);
        let mut stack = vec![LevelFrame {
            frame: Frame::new(graph, root, &scope),
            highest: None,
        }];

        while let Some(top) = stack.last_mut() {
            match top.frame.next_prerequisite() {
                Some(prerequisite) => {
                    if let Some(&level) = memo.get(prerequisite) {
                        top.absorb(level);
                    } else if in_progress.contains(prerequisite) {
                        top.absorb(0);
                    } else {
                        in_progress.insert(prerequisite);
                        stack.push(LevelFrame {
                            frame: Frame::new(graph, prerequisite, &scope),
                            highest: None,
                        });
                    }
                }
                None => {
                    let name = top.frame.name;
                    let level = top.level();
                    stack.pop();
                    in_progress.remove(name);
                    memo.insert(name, level);
                    if let Some(parent) = stack.last_mut() {
                        parent.absorb(level);
                    }
                }
            }
        }
    }

    memo.into_iter().map(|(name, level)| (name.to_string(), level)).collect()
}

/// Annotate graph nodes with their level and group `entities` by level
///
/// Within a level, entities keep the order they have in `entities`.
pub fn assign_levels(graph: &mut DependencyGraph, entities: &[String]) -> BTreeMap<u32, Vec<String>> {
    let levels = compute_levels(graph, entities);
    let mut grouped: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    let mut placed: HashSet<&str> = HashSet::new();

    for name in entities {
        let Some(&level) = levels.get(name) else {
            continue;
        };
        if !placed.insert(name.as_str()) {
            continue;
        }
        graph.set_level(name, level);
        grouped.entry(level).or_default().push(name.clone());
    }

    grouped
}
