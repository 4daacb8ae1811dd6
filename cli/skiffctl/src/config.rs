//! CLI configuration.
//!
//! The server address is resolved in order: `--server` flag,
//! `SKIFF_SERVER` environment variable, config file, built-in default.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";

const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

fn config_path() -> Result<PathBuf> {
    ProjectDirs::from("run", "skiff", "skiff")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Orchestrator base URL.
    #[serde(default = "default_server")]
    pub server: String,
}

fn default_server() -> String {
    std::env::var("SKIFF_SERVER").unwrap_or_else(|_| DEFAULT_SERVER.to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: default_server(),
        }
    }
}

impl Config {
    /// Load config from disk, or return default.
    pub fn load() -> Result<Self> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {path:?}"))?;

        toml::from_str(&contents).with_context(|| format!("Failed to parse config from {path:?}"))
    }

    /// Save config to disk.
    pub fn save(&self) -> Result<()> {
        let path = config_path()?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {dir:?}"))?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents).with_context(|| format!("Failed to write config to {path:?}"))
    }
}
