//! Editable tree session: the intent surface consumed by a presentation layer.
//!
//! A [`TreeSession`] owns the current [`Forest`], the set of expanded nodes,
//! the id generator and the load coordinator. Structural intents go straight
//! through [`core`](crate::core); `expand` may suspend on the child source.
//! Every method takes `&self`, so several expands may be in flight at once on
//! a single-threaded runtime.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::core::algebra::{insert_at, locate, remove_by_id, update_by_id};
use crate::core::ids::IdGenerator;
use crate::core::moves::move_node;
use crate::io::config::GroveConfig;
use crate::load::coordinator::LoadCoordinator;
use crate::load::latency::LatencyPolicy;
use crate::load::source::ChildSource;
use crate::tree::{Forest, Node, NodeId};

/// A caller intent, as issued by a UI or read from a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Intent {
    Expand {
        id: NodeId,
    },
    Collapse {
        id: NodeId,
    },
    Rename {
        id: NodeId,
        name: String,
    },
    AddChild {
        parent: NodeId,
        name: String,
    },
    Remove {
        id: NodeId,
    },
    /// Insert a prepared node (for example one captured before a remove).
    Insert {
        #[serde(default)]
        parent: Option<NodeId>,
        #[serde(default)]
        index: usize,
        node: Node,
    },
    Move {
        id: NodeId,
        #[serde(default)]
        parent: Option<NodeId>,
        #[serde(default)]
        index: usize,
    },
}

/// What an expand did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// No node with that id.
    NotFound,
    /// Children were already materialized (or the node is a leaf).
    Expanded,
    /// A load for this node was already outstanding; nothing was started.
    AlreadyLoading,
    /// Children were loaded and attached.
    Loaded { children: usize, from_cache: bool },
}

#[derive(Debug)]
struct SessionState {
    ids: IdGenerator,
    expanded: HashSet<NodeId>,
}

pub struct TreeSession<S> {
    forest: watch::Sender<Forest>,
    state: Mutex<SessionState>,
    loads: LoadCoordinator<S>,
}

impl<S: ChildSource> TreeSession<S> {
    /// Start a session with default configuration.
    pub fn new(forest: Forest, source: S) -> Self {
        Self::with_config(forest, source, &GroveConfig::default())
    }

    pub fn with_config(forest: Forest, source: S, config: &GroveConfig) -> Self {
        Self::with_parts(
            forest,
            source,
            &config.id_prefix,
            LatencyPolicy::from(&config.latency),
        )
    }

    pub fn with_parts(forest: Forest, source: S, id_prefix: &str, latency: LatencyPolicy) -> Self {
        let ids = IdGenerator::seeded_from(&forest, id_prefix);
        let (tx, _) = watch::channel(forest);
        Self {
            forest: tx,
            state: Mutex::new(SessionState {
                ids,
                expanded: HashSet::new(),
            }),
            loads: LoadCoordinator::new(source, latency),
        }
    }

    /// Current forest version.
    pub fn forest(&self) -> Forest {
        self.forest.borrow().clone()
    }

    /// Watch forest versions. Receivers are only notified when an intent
    /// actually produced a new forest.
    pub fn subscribe(&self) -> watch::Receiver<Forest> {
        self.forest.subscribe()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.state().expanded.contains(id)
    }

    pub fn is_loading(&self, id: &str) -> bool {
        self.loads.is_loading(id)
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<HashSet<NodeId>> {
        self.loads.subscribe()
    }

    pub fn loads(&self) -> &LoadCoordinator<S> {
        &self.loads
    }

    /// Reveal a node's children, loading them first if they are not
    /// materialized yet.
    ///
    /// A node removed or collapsed while its load is outstanding still
    /// receives the loaded children once the load settles.
    pub async fn expand(&self, id: &str) -> Result<ExpandOutcome> {
        let forest = self.forest();
        let Some(node) = locate(&forest, id) else {
            debug!(id, "expand ignored: node not found");
            return Ok(ExpandOutcome::NotFound);
        };
        let node_id = node.id.clone();
        let needs_load = node.needs_load();
        self.state().expanded.insert(node_id.clone());
        if !needs_load {
            return Ok(ExpandOutcome::Expanded);
        }

        let Some(guard) = self.loads.begin(&node_id) else {
            return Ok(ExpandOutcome::AlreadyLoading);
        };
        let loaded = match self.loads.fetch(&guard).await {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(id, error = %format!("{:#}", err), "load failed");
                self.state().expanded.remove(id);
                return Err(err);
            }
        };

        let count = loaded.children.len();
        self.state().ids.observe(&loaded.children);
        let children = loaded.children;
        let forest = self.commit(|forest| {
            update_by_id(forest, id, |node| Node {
                has_children: Some(!children.is_empty()),
                children: Some(children),
                ..node.clone()
            })
        });
        if locate(&forest, id).is_none() {
            debug!(id, "node vanished while loading; children kept in cache only");
        }
        drop(guard);

        Ok(ExpandOutcome::Loaded {
            children: count,
            from_cache: loaded.from_cache,
        })
    }

    /// Hide a node's children. Returns false if it was not expanded.
    pub fn collapse(&self, id: &str) -> bool {
        self.state().expanded.remove(id)
    }

    /// Rename a node. Blank names (after trimming) are ignored.
    pub fn rename(&self, id: &str, name: &str) -> Forest {
        let name = name.trim();
        if name.is_empty() {
            return self.forest();
        }
        self.commit(|forest| {
            update_by_id(forest, id, |node| Node {
                name: name.to_string(),
                ..node.clone()
            })
        })
    }

    /// Append a new child with a generated id. Blank names are ignored.
    pub fn add_child(&self, parent_id: &str, name: &str) -> Forest {
        let name = name.trim();
        if name.is_empty() {
            return self.forest();
        }
        let id = self.state().ids.next();
        debug!(parent = parent_id, id = %id, "add child");
        let child = Arc::new(Node::leaf(id, name));
        self.commit(|forest| insert_at(forest, Some(parent_id), usize::MAX, child))
    }

    /// Detach a node and its whole subtree.
    pub fn remove(&self, id: &str) -> Forest {
        let mut removed = None;
        let forest = self.commit(|forest| {
            let removal = remove_by_id(forest, id);
            removed = removal.removed;
            removal.forest
        });
        if let Some(removed) = removed {
            let gone = Forest::new(vec![removed]);
            let mut state = self.state();
            for node in gone.walk() {
                state.expanded.remove(node.id.as_str());
            }
        }
        forest
    }

    /// Insert `node` with its subtree under `parent` (or among the roots) at
    /// `index`.
    ///
    /// The caller keeps ids unique; the id generator is raised above the
    /// inserted ids so later `add_child` calls cannot collide with them.
    pub fn insert_node(&self, parent: Option<&str>, index: usize, node: Node) -> Forest {
        let node = Arc::new(node);
        self.state().ids.observe(std::slice::from_ref(&node));
        self.commit(|forest| insert_at(forest, parent, index, node))
    }

    /// Relocate a node under `new_parent` (or to the roots) at `index`.
    pub fn move_node(&self, id: &str, new_parent: Option<&str>, index: usize) -> Forest {
        self.commit(|forest| move_node(forest, id, new_parent, index))
    }

    /// Dispatch an intent and return the resulting forest.
    pub async fn apply(&self, intent: &Intent) -> Result<Forest> {
        match intent {
            Intent::Expand { id } => {
                self.expand(id.as_str()).await?;
            }
            Intent::Collapse { id } => {
                self.collapse(id.as_str());
            }
            Intent::Rename { id, name } => {
                self.rename(id.as_str(), name);
            }
            Intent::AddChild { parent, name } => {
                self.add_child(parent.as_str(), name);
            }
            Intent::Remove { id } => {
                self.remove(id.as_str());
            }
            Intent::Insert {
                parent,
                index,
                node,
            } => {
                self.insert_node(parent.as_ref().map(NodeId::as_str), *index, node.clone());
            }
            Intent::Move { id, parent, index } => {
                self.move_node(id.as_str(), parent.as_ref().map(NodeId::as_str), *index);
            }
        }
        Ok(self.forest())
    }

    /// Replace the forest with `transform(current)`; subscribers are only
    /// notified when the result is a new version.
    fn commit<F>(&self, transform: F) -> Forest
    where
        F: FnOnce(&Forest) -> Forest,
    {
        let mut next = None;
        self.forest.send_if_modified(|current| {
            let updated = transform(current);
            let changed = !updated.ptr_eq(current);
            if changed {
                *current = updated.clone();
            }
            next = Some(updated);
            changed
        });
        next.unwrap_or_else(|| self.forest())
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
