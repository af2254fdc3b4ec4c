//! Drag-to-move relocation with a cycle guard.

use crate::core::algebra::{contains, insert_at, locate, remove_by_id};
use crate::tree::Forest;

/// Relocate `node_id` (with its subtree) under `new_parent` at `index`.
///
/// `index` is interpreted against the sibling list *after* the node has been
/// removed. Returns `forest` unchanged when the node or the target parent is
/// missing, or when the target lies inside the moved subtree.
pub fn move_node(forest: &Forest, node_id: &str, new_parent: Option<&str>, index: usize) -> Forest {
    let Some(node) = locate(forest, node_id) else {
        return forest.clone();
    };

    if let Some(parent_id) = new_parent {
        if contains(node, parent_id) {
            return forest.clone();
        }
        if locate(forest, parent_id).is_none() {
            return forest.clone();
        }
    }

    let removal = remove_by_id(forest, node_id);
    match removal.removed {
        Some(detached) => insert_at(&removal.forest, new_parent, index, detached),
        None => forest.clone(),
    }
}
