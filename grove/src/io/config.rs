//! Session configuration stored in `grove.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config file name, relative to the working directory.
pub const CONFIG_FILE: &str = "grove.toml";

/// Tree session configuration (TOML).
///
/// Missing fields default to the values below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GroveConfig {
    /// Prefix for ids issued to newly created nodes.
    pub id_prefix: String,

    pub latency: LatencyConfig,
}

/// Simulated backend latency for lazy loads, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LatencyConfig {
    /// Fixed delay before replaying a cached load.
    pub cached_ms: u64,

    /// Lower bound of the randomized first-fetch delay.
    pub fetch_min_ms: u64,

    /// Upper bound of the randomized first-fetch delay.
    pub fetch_max_ms: u64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            cached_ms: 150,
            fetch_min_ms: 400,
            fetch_max_ms: 1200,
        }
    }
}

impl Default for GroveConfig {
    fn default() -> Self {
        Self {
            id_prefix: "n".to_string(),
            latency: LatencyConfig::default(),
        }
    }
}

impl GroveConfig {
    pub fn validate(&self) -> Result<()> {
        if self.id_prefix.trim().is_empty() {
            return Err(anyhow!("id_prefix must not be blank"));
        }
        if self.id_prefix.ends_with(|c: char| c.is_ascii_digit()) {
            return Err(anyhow!("id_prefix must not end with a digit"));
        }
        if self.latency.fetch_min_ms > self.latency.fetch_max_ms {
            return Err(anyhow!(
                "latency.fetch_min_ms ({}) must be <= latency.fetch_max_ms ({})",
                self.latency.fetch_min_ms,
                self.latency.fetch_max_ms
            ));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `GroveConfig::default()`.
pub fn load_config(path: &Path) -> Result<GroveConfig> {
    if !path.exists() {
        let cfg = GroveConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: GroveConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &GroveConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, GroveConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join(CONFIG_FILE);
        let cfg = GroveConfig {
            id_prefix: "node-".to_string(),
            latency: LatencyConfig {
                cached_ms: 5,
                fetch_min_ms: 10,
                fetch_max_ms: 20,
            },
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "[latency]\ncached_ms = 0\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.id_prefix, "n");
        assert_eq!(cfg.latency.cached_ms, 0);
        assert_eq!(cfg.latency.fetch_max_ms, 1200);
    }

    #[test]
    fn rejects_inverted_latency_band() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "[latency]\nfetch_min_ms = 10\nfetch_max_ms = 5\n").expect("write");
        let err = load_config(&path).expect_err("expected error");
        assert!(err.to_string().contains("fetch_min_ms"));
    }

    #[test]
    fn rejects_prefix_ending_in_digit() {
        let cfg = GroveConfig {
            id_prefix: "n1".to_string(),
            ..GroveConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
