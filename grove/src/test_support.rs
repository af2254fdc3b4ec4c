//! Test-only helpers for constructing forests and child sources.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

use crate::load::source::ChildSource;
use crate::tree::{Forest, Node, NodeId, NodeRef};

/// Create a childless node named after its id.
pub fn leaf(id: &str) -> NodeRef {
    Arc::new(Node::leaf(id, format!("{} name", id)))
}

/// Create a node whose children have not been fetched yet.
pub fn lazy(id: &str) -> NodeRef {
    Arc::new(Node::lazy(id, format!("{} name", id)))
}

/// Create a node with materialized children.
pub fn branch(id: &str, children: Vec<NodeRef>) -> NodeRef {
    Arc::new(Node::with_children(id, format!("{} name", id), children))
}

pub fn forest(roots: Vec<NodeRef>) -> Forest {
    Forest::new(roots)
}

/// Pre-order ids of every node in the forest.
pub fn ids(forest: &Forest) -> Vec<String> {
    forest
        .walk()
        .iter()
        .map(|node| node.id.to_string())
        .collect()
}

/// Ids of the direct children of `id` (empty when absent or unloaded).
pub fn child_ids(forest: &Forest, id: &str) -> Vec<String> {
    crate::core::algebra::locate(forest, id)
        .map(|node| node.children().iter().map(|c| c.id.to_string()).collect())
        .unwrap_or_default()
}

/// In-memory child source that records every fetch.
#[derive(Debug, Default)]
pub struct RecordingSource {
    children: HashMap<NodeId, Vec<Node>>,
    failing: Mutex<HashSet<NodeId>>,
    calls: AtomicUsize,
}

impl RecordingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, parent: &str, children: Vec<Node>) -> Self {
        self.children.insert(NodeId::from(parent), children);
        self
    }

    /// Make fetches for `parent` fail until `heal` is called.
    pub fn fail(&self, parent: &str) {
        self.failing
            .lock()
            .expect("failing lock")
            .insert(NodeId::from(parent));
    }

    pub fn heal(&self, parent: &str) {
        self.failing.lock().expect("failing lock").remove(parent);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChildSource for RecordingSource {
    async fn fetch_children(&self, id: &NodeId) -> Result<Vec<Node>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().expect("failing lock").contains(id) {
            return Err(anyhow!("backend unavailable for '{}'", id));
        }
        Ok(self.children.get(id).cloned().unwrap_or_default())
    }
}
