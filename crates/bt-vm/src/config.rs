//! VM configuration, loaded from YAML.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Deepest nesting of `tick` calls before the tick is aborted.
    #[serde(default = "default_max_tick_depth")]
    pub max_tick_depth: usize,

    /// Record `bt.tick` / `bt.reset` events into the blackboard trace log.
    #[serde(default)]
    pub trace: bool,
}

fn default_max_tick_depth() -> usize {
    256
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_tick_depth: default_max_tick_depth(),
            trace: false,
        }
    }
}

impl VmConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read VM config from {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse VM config from {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        if config.max_tick_depth == 0 {
            anyhow::bail!("max_tick_depth must be at least 1");
        }
        Ok(config)
    }

    /// Load `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
