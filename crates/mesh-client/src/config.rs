//! TOML configuration for the client binary.
//!
//! Every field carries a `#[serde(default = "…")]` so a partial file, or no
//! file at all, still yields a working configuration.  The defaults are the
//! protocol's conventional values: scan the sixteen-address range, talk to
//! the server at address 7 on service port 10.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mesh_core::{Address, Port, ScanConfig, SessionConfig};

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

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub node: NodeSection,
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default)]
    pub session: SessionSection,
}

/// Identity of this node on the network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSection {
    /// Our own address.
    #[serde(default)]
    pub address: Address,
    /// Hostname reported to identification queries.
    #[serde(default = "default_hostname")]
    pub hostname: String,
}

/// Address-range sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanSection {
    /// First address to probe.
    #[serde(default)]
    pub begin: Address,
    /// Last address to probe (inclusive).
    #[serde(default = "default_scan_end")]
    pub end: Address,
    /// Per-probe timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Identification query timeout in milliseconds.
    #[serde(default = "default_identify_timeout_ms")]
    pub identify_timeout_ms: u64,
}

/// Diagnostic session settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSection {
    /// Address of the server node.
    #[serde(default = "default_target")]
    pub target: Address,
    /// Destination port of the server's application handler.
    #[serde(default = "default_port")]
    pub port: Port,
    /// Liveness probe timeout in milliseconds.
    #[serde(default = "default_session_timeout_ms")]
    pub ping_timeout_ms: u64,
    /// Connection setup timeout in milliseconds.
    #[serde(default = "default_session_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Run a server dispatch loop in-process so the exchange completes
    /// without a second binary.
    #[serde(default)]
    pub test_mode: bool,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "mesh-client".to_string())
}
fn default_scan_end() -> Address {
    16
}
fn default_probe_timeout_ms() -> u64 {
    20
}
fn default_identify_timeout_ms() -> u64 {
    100
}
fn default_target() -> Address {
    7
}
fn default_port() -> Port {
    10
}
fn default_session_timeout_ms() -> u64 {
    1000
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            address: 0,
            hostname: default_hostname(),
        }
    }
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            begin: 0,
            end: default_scan_end(),
            probe_timeout_ms: default_probe_timeout_ms(),
            identify_timeout_ms: default_identify_timeout_ms(),
        }
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            target: default_target(),
            port: default_port(),
            ping_timeout_ms: default_session_timeout_ms(),
            connect_timeout_ms: default_session_timeout_ms(),
            test_mode: false,
        }
    }
}

// ── Conversions into core loop parameters ─────────────────────────────────────

impl AppConfig {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            begin: self.scan.begin,
            end: self.scan.end,
            probe_timeout: Duration::from_millis(self.scan.probe_timeout_ms),
            identify_timeout: Duration::from_millis(self.scan.identify_timeout_ms),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            target: self.session.target,
            port: self.session.port,
            ping_timeout: Duration::from_millis(self.session.ping_timeout_ms),
            connect_timeout: Duration::from_millis(self.session.connect_timeout_ms),
            ..SessionConfig::default()
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

/// Default config file location: `mesh-client.toml` next to the binary's
/// working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("mesh-client.toml")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
