//! Where a node sits in a forest: its parent and sibling index.

use crate::tree::{Forest, NodeId, NodeRef};

/// Parent and sibling index of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// `None` for roots.
    pub parent: Option<NodeId>,
    pub index: usize,
}

/// Locate `target_id` and report its parent and index among its siblings.
pub fn position(forest: &Forest, target_id: &str) -> Option<Position> {
    position_in(forest.roots(), None, target_id)
}

fn position_in(nodes: &[NodeRef], parent: Option<&NodeId>, target_id: &str) -> Option<Position> {
    for (index, node) in nodes.iter().enumerate() {
        if node.id == *target_id {
            return Some(Position {
                parent: parent.cloned(),
                index,
            });
        }
        if let Some(found) = position_in(node.children(), Some(&node.id), target_id) {
            return Some(found);
        }
    }
    None
}
