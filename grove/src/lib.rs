//! Editable, lazily loaded tree of named nodes.
//!
//! Every edit is a pure transformation from one immutable [`tree::Forest`]
//! to the next, sharing untouched subtrees so observers can diff versions by
//! identity. The crate is split the same way the data flows:
//!
//! - **[`core`]**: Pure, deterministic structure operations (locate, update,
//!   remove, insert, move with cycle guard, id generation). No I/O, no awaits.
//! - **[`load`]**: Lazy child loading: the child source seam, the append-only
//!   cache and the coordinator that allows one fetch per node at a time.
//! - **[`session`]**: The intent surface (expand, rename, add, remove, move)
//!   tying the two together around one owned forest.
//! - **[`io`]**: Configuration and seed-data files for the CLI.

pub mod core;
pub mod io;
pub mod load;
pub mod logging;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tree;
