//! Configuration file handling for scanlink-cli

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default daemon endpoint
    pub server: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Disable colored output
    pub no_color: Option<bool>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("scanlink");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(
        &self,
        server: Option<&str>,
        timeout_secs: Option<u64>,
        no_color: bool,
    ) -> MergedConfig {
        MergedConfig {
            server: server
                .map(String::from)
                .or_else(|| self.server.clone())
                .unwrap_or_else(|| "ws://localhost:8765".to_string()),
            timeout_secs: timeout_secs.or(self.timeout_secs),
            no_color: no_color || self.no_color.unwrap_or(false),
        }
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub server: String,
    pub timeout_secs: Option<u64>,
    pub no_color: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_args_override_file_values() {
        let config = Config {
            server: Some("ws://filehost:9000".to_string()),
            timeout_secs: Some(30),
            no_color: Some(false),
        };

        let merged = config.merge_with_args(Some("ws://clihost:8765"), None, true);
        assert_eq!(merged.server, "ws://clihost:8765");
        assert_eq!(merged.timeout_secs, Some(30));
        assert!(merged.no_color);
    }

    #[test]
    fn empty_config_falls_back_to_defaults() {
        let merged = Config::default().merge_with_args(None, None, false);
        assert_eq!(merged.server, "ws://localhost:8765");
        assert_eq!(merged.timeout_secs, None);
        assert!(!merged.no_color);
    }
}
