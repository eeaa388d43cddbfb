//! TOML configuration for the server binary.
//!
//! Mirrors the client's file layout: a `[node]` section for our own identity
//! plus a `[server]` section for the dispatch loop's timing and capacity
//! parameters.  All fields default to the protocol's conventional values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mesh_core::{Address, DispatchConfig, Port};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub node: NodeSection,
    #[serde(default)]
    pub server: ServerSection,
}

/// Identity of this node on the network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSection {
    /// Our own address.  The conventional server address is 7.
    #[serde(default = "default_address")]
    pub address: Address,
    /// Hostname reported to identification queries.
    #[serde(default = "default_hostname")]
    pub hostname: String,
}

/// Dispatch loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    /// Port whose packets go to the application handler.
    #[serde(default = "default_service_port")]
    pub service_port: Port,
    /// Pending-connection capacity of the listening socket.
    #[serde(default = "default_backlog")]
    pub backlog: usize,
    /// Accept timeout in milliseconds.
    #[serde(default = "default_accept_timeout_ms")]
    pub accept_timeout_ms: u64,
    /// Per-packet read timeout in milliseconds.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_address() -> Address {
    7
}
fn default_hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "mesh-server".to_string())
}
fn default_service_port() -> Port {
    10
}
fn default_backlog() -> usize {
    10
}
fn default_accept_timeout_ms() -> u64 {
    10_000
}
fn default_read_timeout_ms() -> u64 {
    50
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            address: default_address(),
            hostname: default_hostname(),
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            service_port: default_service_port(),
            backlog: default_backlog(),
            accept_timeout_ms: default_accept_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

// ── Conversion into core loop parameters ──────────────────────────────────────

impl AppConfig {
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            service_port: self.server.service_port,
            backlog: self.server.backlog,
            accept_timeout: Duration::from_millis(self.server.accept_timeout_ms),
            read_timeout: Duration::from_millis(self.server.read_timeout_ms),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads the configuration from `path`, returning `AppConfig::default()` if
/// the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("mesh-server.toml")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
