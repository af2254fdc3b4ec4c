//! Deterministic, pure tree logic.
//!
//! Core modules must be free of I/O and suspension points. They operate on
//! immutable [`Forest`](crate::tree::Forest) values and return new ones.

pub mod algebra;
pub mod ids;
pub mod invariants;
pub mod moves;
pub mod path;
