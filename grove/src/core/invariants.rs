//! Semantic invariants of a forest that the type system does not enforce.

use std::collections::HashSet;

use crate::tree::{Forest, Node};

/// Check forest invariants:
/// - No duplicate ids anywhere in the forest
/// - No blank names
/// - `has_children = false` never coexists with materialized children
pub fn validate_invariants(forest: &Forest) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for root in forest.roots() {
        validate_node(root, &mut seen, &mut errors, root.id.as_str());
    }
    errors
}

fn validate_node<'a>(
    node: &'a Node,
    seen: &mut HashSet<&'a str>,
    errors: &mut Vec<String>,
    path: &str,
) {
    if !seen.insert(node.id.as_str()) {
        errors.push(format!("duplicate id '{}' at {}", node.id, path));
    }

    if node.name.trim().is_empty() {
        errors.push(format!("{}: name must not be blank", path));
    }

    if node.has_children == Some(false) && !node.children().is_empty() {
        errors.push(format!(
            "{}: has_children is false but {} children are present",
            path,
            node.children().len()
        ));
    }

    for child in node.children() {
        let child_path = format!("{}/{}", path, child.id);
        validate_node(child, seen, errors, &child_path);
    }
}
