//! Pure structural operations over a [`Forest`].
//!
//! Every function returns a new forest that shares all untouched subtrees
//! with its input. Walks return `Option<Vec<NodeRef>>` where `None` means
//! "nothing changed below here", so unchanged branches keep their `Arc`
//! identity and a full no-op returns the input forest itself.

use std::sync::Arc;

use crate::tree::{Forest, Node, NodeRef};

/// Result of [`remove_by_id`]: the new forest plus the detached subtree.
#[derive(Clone, Debug)]
pub struct Removal {
    pub forest: Forest,
    pub removed: Option<NodeRef>,
}

/// Find the first node with `id` in depth-first pre-order.
pub fn locate<'a>(forest: &'a Forest, id: &str) -> Option<&'a NodeRef> {
    locate_in(forest.roots(), id)
}

fn locate_in<'a>(nodes: &'a [NodeRef], id: &str) -> Option<&'a NodeRef> {
    for node in nodes {
        if node.id == *id {
            return Some(node);
        }
        if let Some(found) = locate_in(node.children(), id) {
            return Some(found);
        }
    }
    None
}

/// True if `id` is `node` itself or anywhere in its subtree.
pub fn contains(node: &Node, id: &str) -> bool {
    node.id == *id || node.children().iter().any(|child| contains(child, id))
}

/// Replace the node with `id` by `transform(node)`.
///
/// Only the ancestor chain of the match is rebuilt. Returns `forest` itself
/// when no node matches.
pub fn update_by_id<F>(forest: &Forest, id: &str, transform: F) -> Forest
where
    F: FnOnce(&Node) -> Node,
{
    let mut transform = Some(transform);
    match update_in(forest.roots(), id, &mut transform) {
        Some(roots) => Forest::new(roots),
        None => forest.clone(),
    }
}

fn update_in<F>(nodes: &[NodeRef], id: &str, transform: &mut Option<F>) -> Option<Vec<NodeRef>>
where
    F: FnOnce(&Node) -> Node,
{
    for (index, node) in nodes.iter().enumerate() {
        let replacement = if node.id == *id {
            transform.take().map(|f| Arc::new(f(&**node)))
        } else {
            update_in(node.children(), id, transform).map(|children| {
                Arc::new(Node {
                    children: Some(children),
                    ..Node::clone(node)
                })
            })
        };

        if let Some(replacement) = replacement {
            let mut rebuilt = nodes.to_vec();
            rebuilt[index] = replacement;
            return Some(rebuilt);
        }
    }
    None
}

/// Detach the node with `id` and its whole subtree.
///
/// The parent that lost the child has `has_children` recomputed from its
/// remaining children.
pub fn remove_by_id(forest: &Forest, id: &str) -> Removal {
    match remove_in(forest.roots(), id) {
        Some((roots, removed)) => Removal {
            forest: Forest::new(roots),
            removed: Some(removed),
        },
        None => Removal {
            forest: forest.clone(),
            removed: None,
        },
    }
}

fn remove_in(nodes: &[NodeRef], id: &str) -> Option<(Vec<NodeRef>, NodeRef)> {
    for (index, node) in nodes.iter().enumerate() {
        if node.id == *id {
            let mut rebuilt = nodes.to_vec();
            let removed = rebuilt.remove(index);
            return Some((rebuilt, removed));
        }

        let Some((children, removed)) = remove_in(node.children(), id) else {
            continue;
        };
        let was_direct_parent = children.len() < node.children().len();
        let has_children = if was_direct_parent {
            Some(!children.is_empty())
        } else {
            node.has_children
        };
        let mut rebuilt = nodes.to_vec();
        rebuilt[index] = Arc::new(Node {
            children: Some(children),
            has_children,
            ..Node::clone(node)
        });
        return Some((rebuilt, removed));
    }
    None
}

/// Insert `node` at `index` under `parent`, or among the roots when `parent`
/// is `None`.
///
/// `index` is clamped to the sibling count. The parent always ends up with
/// `has_children = Some(true)`. An unknown parent leaves the forest unchanged.
pub fn insert_at(forest: &Forest, parent: Option<&str>, index: usize, node: NodeRef) -> Forest {
    match parent {
        None => {
            let mut roots = forest.roots().to_vec();
            let index = index.min(roots.len());
            roots.insert(index, node);
            Forest::new(roots)
        }
        Some(parent_id) => update_by_id(forest, parent_id, |parent| {
            let mut children = parent.children().to_vec();
            let index = index.min(children.len());
            children.insert(index, node);
            Node {
                children: Some(children),
                has_children: Some(true),
                ..parent.clone()
            }
        }),
    }
}
