//! Daemon configuration (TOML)

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Default daemon port; the client's default endpoint points here
pub const DEFAULT_PORT: u16 = 8765;

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Listen address settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: IpAddr,
    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Settings for the built-in demo scanner backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Simulated acquisition time in milliseconds
    #[serde(default = "default_scan_latency_ms")]
    pub scan_latency_ms: u64,
    /// Status text sent in the pre-scan `ping` frame
    #[serde(default = "default_ping_status")]
    pub ping_status: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            scan_latency_ms: default_scan_latency_ms(),
            ping_status: default_ping_status(),
        }
    }
}

fn default_scan_latency_ms() -> u64 {
    500
}

fn default_ping_status() -> String {
    "Scanning in progress...".to_string()
}

impl DaemonConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}
