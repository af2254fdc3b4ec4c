use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Shared handle to an immutable node.
///
/// Unchanged subtrees are shared between successive forest versions, so
/// `Arc::ptr_eq` on two handles tells whether a branch was rebuilt.
pub type NodeRef = Arc<Node>;

/// Opaque, process-unique node identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// `None` until loaded, or for a node that never had children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeRef>>,
    /// Lazy-loading hint: `Some(true)` means children exist but may not be
    /// materialized yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_children: Option<bool>,
}

impl Node {
    /// A childless node.
    pub fn leaf(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: None,
            has_children: None,
        }
    }

    /// A node whose children are fetched on first expand.
    pub fn lazy(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            has_children: Some(true),
            ..Self::leaf(id, name)
        }
    }

    /// A node with materialized children.
    pub fn with_children(
        id: impl Into<NodeId>,
        name: impl Into<String>,
        children: Vec<NodeRef>,
    ) -> Self {
        let has_children = Some(!children.is_empty());
        Self {
            children: Some(children),
            has_children,
            ..Self::leaf(id, name)
        }
    }

    pub fn children(&self) -> &[NodeRef] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// True when an expand must go to the child source first.
    pub fn needs_load(&self) -> bool {
        self.has_children == Some(true) && self.children.is_none()
    }
}

/// Ordered sequence of root nodes; the whole tree state is one `Forest`.
///
/// Cloning is cheap (one `Arc` bump). Every transformation returns a new
/// forest, or the same `Arc` when nothing changed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Forest(Arc<Vec<NodeRef>>);

impl Forest {
    pub fn new(roots: Vec<NodeRef>) -> Self {
        Self(Arc::new(roots))
    }

    pub fn from_nodes(roots: impl IntoIterator<Item = Node>) -> Self {
        Self::new(roots.into_iter().map(Arc::new).collect())
    }

    pub fn roots(&self) -> &[NodeRef] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Identity comparison: true when both values are the same version.
    pub fn ptr_eq(&self, other: &Forest) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Visit every node in depth-first pre-order.
    pub fn walk(&self) -> Vec<&NodeRef> {
        let mut out = Vec::new();
        let mut stack: Vec<&NodeRef> = self.0.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children().iter().rev());
        }
        out
    }
}
