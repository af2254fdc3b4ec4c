//! Lazy child loading: the fetch collaborator, the append-only cache and the
//! coordinator that keeps at most one fetch in flight per node.
//!
//! This is the only part of the crate with suspension points. Shared state is
//! updated between awaits and never locked across one.

pub mod cache;
pub mod coordinator;
pub mod latency;
pub mod source;
