//! CLI configuration, read from ~/.lumen/config/lumen.toml by default.

use anyhow::{anyhow, Context, Result};
use lumen_io::WriteOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LumenConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Byte layout of written files
    #[serde(default)]
    pub conversion: WriteOptions,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BatchConfig {
    /// Worker threads (0 = all cores)
    #[serde(default)]
    pub threads: usize,
}

/// Location: ~/.lumen/config/lumen.toml
pub fn default_config_path() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| anyhow!("Cannot determine home directory"))
        .map(|home| home.join(".lumen").join("config").join("lumen.toml"))
}

/// Load an explicit config file, or the default one when it exists.
///
/// An explicit path that does not exist is an error; a missing default file
/// just means defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<LumenConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Ok(path) if path.exists() => path,
            _ => return Ok(LumenConfig::default()),
        },
    };
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("reading config '{}'", path.display()))?;
    parse_config(&contents).with_context(|| format!("parsing config '{}'", path.display()))
}

pub fn parse_config(contents: &str) -> Result<LumenConfig> {
    Ok(toml::from_str(contents)?)
}
