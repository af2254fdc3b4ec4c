//! File helpers for the `grove` CLI.

pub mod config;
pub mod forest_store;
