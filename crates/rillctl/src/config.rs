//! TOML configuration for the Rill control tool.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Local node paths.
    pub node: NodeSection,
    /// Spoke fleet and ring tuning.
    pub ring: RingSection,
    /// Coordination-store paths.
    pub coord: CoordSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[node]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Directory for persistent data (the local coordination store).
    pub data_dir: PathBuf,
}

impl Default for NodeSection {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".rill"))
            .unwrap_or_else(|| PathBuf::from(".rill"));
        Self { data_dir }
    }
}

/// `[ring]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RingSection {
    /// The spoke fleet to resolve placements against.
    pub spokes: Vec<String>,
    /// How long past ring snapshots stay answerable, in minutes.
    pub retention_minutes: Option<u64>,
}

/// `[coord]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CoordSection {
    /// Path prefix for watermark nodes.
    pub watermark_prefix: Option<String>,
    /// Path prefix for persisted ring snapshots.
    pub ring_prefix: Option<String>,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Directory holding the local coordination store.
    pub fn coord_dir(&self) -> PathBuf {
        self.node.data_dir.join("coord")
    }

    /// Effective ring retention in milliseconds.
    pub fn retention_ms(&self) -> u64 {
        self.ring
            .retention_minutes
            .map(|m| m * 60_000)
            .unwrap_or(rill_placement::DEFAULT_RETENTION_MS)
    }

    /// Effective watermark path prefix.
    pub fn watermark_prefix(&self) -> &str {
        self.coord
            .watermark_prefix
            .as_deref()
            .unwrap_or(rill_coord::DEFAULT_WATERMARK_PREFIX)
    }

    /// Effective ring-log path prefix.
    pub fn ring_prefix(&self) -> &str {
        self.coord
            .ring_prefix
            .as_deref()
            .unwrap_or(rill_coord::DEFAULT_RING_PREFIX)
    }
}
