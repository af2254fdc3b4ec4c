//! Forest load/render helpers with invariant validation.
//!
//! The engine keeps no backing store; these helpers only read seed data and
//! render results for the CLI.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::core::invariants::validate_invariants;
use crate::load::source::FixtureSource;
use crate::tree::{Forest, NodeRef};

/// Load a forest from a JSON array of nodes and check its invariants.
pub fn load_forest(path: &Path) -> Result<Forest> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read forest {}", path.display()))?;
    parse_forest(&contents).with_context(|| format!("load forest {}", path.display()))
}

/// Parse a forest from JSON and check its invariants.
pub fn parse_forest(raw: &str) -> Result<Forest> {
    let forest: Forest = serde_json::from_str(raw).context("parse forest json")?;
    let errors = validate_invariants(&forest);
    if !errors.is_empty() {
        return Err(anyhow!("forest invariants failed: {}", errors.join("; ")));
    }
    Ok(forest)
}

/// Load a children fixture (`{"id": [nodes...]}`) for lazy loading.
pub fn load_children(path: &Path) -> Result<FixtureSource> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read children {}", path.display()))?;
    FixtureSource::from_json(&contents).with_context(|| format!("load children {}", path.display()))
}

/// Pretty JSON with trailing newline.
pub fn render_json(forest: &Forest) -> Result<String> {
    let mut buf = serde_json::to_string_pretty(forest).context("serialize forest")?;
    buf.push('\n');
    Ok(buf)
}

/// Indented outline, one node per line.
///
/// Unloaded lazy nodes are marked with `+`, loaded parents with `-`.
pub fn render_outline(forest: &Forest) -> String {
    let mut out = String::new();
    for root in forest.roots() {
        outline_node(root, 0, &mut out);
    }
    out
}

fn outline_node(node: &NodeRef, depth: usize, out: &mut String) {
    let marker = if node.needs_load() {
        '+'
    } else if node.children().is_empty() {
        ' '
    } else {
        '-'
    };
    let _ = writeln!(
        out,
        "{:indent$}{} {} [{}]",
        "",
        marker,
        node.name,
        node.id,
        indent = depth * 2
    );
    for child in node.children() {
        outline_node(child, depth + 1, out);
    }
}
