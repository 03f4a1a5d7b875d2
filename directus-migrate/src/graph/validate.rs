//! Validation of user-supplied orders

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::DependencyGraph;

/// Outcome of validating a custom order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Check that no entity in `proposed` comes before one of its prerequisites
///
/// Only reports problems; the proposed order is never corrected. Names that
/// are unknown to the graph or repeated are reported as well.
pub fn validate_custom_order(graph: &DependencyGraph, proposed: &[String]) -> OrderValidation {
    let mut errors = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for (index, name) in proposed.iter().enumerate() {
        if !graph.contains(name) {
            errors.push(format!("'{}' is not a known entity", name));
            continue;
        }
        if positions.contains_key(name.as_str()) {
            errors.push(format!("'{}' appears more than once", name));
            continue;
        }
        positions.insert(name.as_str(), index);
    }

    for name in proposed {
        let Some(&position) = positions.get(name.as_str()) else {
            continue;
        };
        for prerequisite in graph.prerequisites(name) {
            if let Some(&prerequisite_position) = positions.get(prerequisite.as_str()) {
                if position < prerequisite_position {
                    let message = format!(
                        "'{}' is placed before its prerequisite '{}'",
                        name, prerequisite
                    );
                    if !errors.contains(&message) {
                        errors.push(message);
                    }
                }
            }
        }
    }

    OrderValidation {
        valid: errors.is_empty(),
        errors,
    }
}
