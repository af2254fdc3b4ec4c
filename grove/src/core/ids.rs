//! Monotonic identity generator for newly created nodes.

use crate::tree::{Forest, NodeId, NodeRef};

/// Issues ids of the form `{prefix}{n}` with `n` strictly increasing.
///
/// The counter starts above the largest trailing number found in any
/// pre-supplied id, so generated ids never collide with initial data that
/// follows a `prefix + number` scheme. Ids are never reused.
///
/// Trailing numbers are read as `u64` while the counter is a `u128`, so a
/// seed of `u64::MAX` still leaves room above it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGenerator {
    prefix: String,
    next: u128,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    /// Seed the counter above every id already present in `forest`.
    pub fn seeded_from(forest: &Forest, prefix: impl Into<String>) -> Self {
        let mut ids = Self::new(prefix);
        ids.observe(forest.roots());
        ids
    }

    /// Raise the counter above any id in `nodes` and their subtrees.
    pub fn observe(&mut self, nodes: &[NodeRef]) {
        for node in nodes {
            if let Some(n) = trailing_number(node.id.as_str()) {
                self.next = self.next.max(u128::from(n) + 1);
            }
            self.observe(node.children());
        }
    }

    pub fn next(&mut self) -> NodeId {
        let id = NodeId::new(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

fn trailing_number(id: &str) -> Option<u64> {
    let digits = id.len() - id.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    id[id.len() - digits..].parse().ok()
}
