//! Append-only record of the first children fetched for each node.

use std::collections::HashMap;

use crate::tree::{NodeId, NodeRef};

/// Maps a node id to the children it was first loaded with.
///
/// Entries are never invalidated and outlive the node itself; a removed node
/// that is later reinserted with the same id replays its cached children.
#[derive(Debug, Default)]
pub struct LazyCache {
    entries: HashMap<NodeId, Vec<NodeRef>>,
}

impl LazyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Vec<NodeRef>> {
        self.entries.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Store `children` unless `id` already has an entry, and return the
    /// entry that is now authoritative.
    pub fn record(&mut self, id: NodeId, children: Vec<NodeRef>) -> Vec<NodeRef> {
        self.entries.entry(id).or_insert(children).clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
