//! Configuration for the orchestrator.

use std::net::SocketAddr;

use anyhow::{bail, Result};

/// Runtime backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeBackend {
    /// Docker daemon via its local socket.
    Docker,
    /// In-memory mock backend for development and testing.
    Mock,
}

/// Orchestrator configuration, loaded from `SKIFF_*` environment
/// variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address.
    pub listen_addr: SocketAddr,

    /// Data directory for persisted documents.
    pub data_dir: String,

    /// Which container runtime backend to use.
    pub runtime: RuntimeBackend,

    /// Grace period in seconds passed to container stops.
    pub stop_grace_secs: u32,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("SKIFF_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()?;

        let data_dir = std::env::var("SKIFF_DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let runtime = match std::env::var("SKIFF_RUNTIME")
            .unwrap_or_else(|_| "docker".to_string())
            .to_lowercase()
            .as_str()
        {
            "docker" => RuntimeBackend::Docker,
            "mock" => RuntimeBackend::Mock,
            other => bail!("unknown runtime backend: {other} (expected 'docker' or 'mock')"),
        };

        let stop_grace_secs = std::env::var("SKIFF_STOP_GRACE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let log_level = std::env::var("SKIFF_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            listen_addr,
            data_dir,
            runtime,
            stop_grace_secs,
            log_level,
        })
    }
}
