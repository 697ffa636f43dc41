//! Typed view over the merged configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use th_calendar::format::DisplayConfig;

use crate::{load_layered_yaml, LoadedConfig};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_ADDR: &str = "127.0.0.1:8898";

pub const ENV_DATA_DIR: &str = "TH_DATA_DIR";
pub const ENV_DAEMON_ADDR: &str = "TH_DAEMON_ADDR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub dir: String,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            dir: DEFAULT_DATA_DIR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub addr: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataSection,
    pub server: ServerSection,
    pub log: LogSection,
    pub display: DisplayConfig,
}

impl AppConfig {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        serde_json::from_value(config_json.clone()).context("config does not match AppConfig")
    }

    /// Loads layered YAML files (none means all defaults) and returns the
    /// typed config alongside the hashed document.
    pub fn load(paths: &[&str]) -> Result<(Self, LoadedConfig)> {
        let loaded = load_layered_yaml(paths)?;
        let config = Self::from_json(&loaded.config_json)?;
        Ok((config, loaded))
    }

    /// Applies `TH_DATA_DIR` / `TH_DAEMON_ADDR` through `lookup`. Empty values
    /// are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            self.data.dir = dir;
        }
        if let Some(addr) = lookup(ENV_DAEMON_ADDR).filter(|v| !v.trim().is_empty()) {
            self.server.addr = addr;
        }
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }
}
