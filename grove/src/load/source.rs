//! The external child source consulted on cache misses.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};

use crate::tree::{Node, NodeId};

/// Fetches the children of a node from outside the engine.
///
/// The coordinator treats the source as opaque: results are cached verbatim
/// and failures are returned to the caller without retrying.
pub trait ChildSource {
    fn fetch_children(&self, id: &NodeId) -> impl Future<Output = Result<Vec<Node>>> + Send;
}

impl<S: ChildSource + Send + Sync> ChildSource for Arc<S> {
    fn fetch_children(&self, id: &NodeId) -> impl Future<Output = Result<Vec<Node>>> + Send {
        S::fetch_children(self, id)
    }
}

/// Child source backed by a fixed `id -> children` table.
///
/// Ids with no entry fail to load.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    children: HashMap<NodeId, Vec<Node>>,
}

impl FixtureSource {
    pub fn new(children: HashMap<NodeId, Vec<Node>>) -> Self {
        Self { children }
    }

    /// Parse a JSON object mapping node ids to arrays of nodes.
    pub fn from_json(raw: &str) -> Result<Self> {
        let children: HashMap<NodeId, Vec<Node>> =
            serde_json::from_str(raw).context("parse children fixture json")?;
        Ok(Self::new(children))
    }
}

impl ChildSource for FixtureSource {
    async fn fetch_children(&self, id: &NodeId) -> Result<Vec<Node>> {
        self.children
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("no children recorded for '{}'", id))
    }
}
