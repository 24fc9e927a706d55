//! # Configuration Management Module
//!
//! Configuration for the topology monitor, loaded from a TOML file.
//!
//! ## Configuration Structure
//!
//! - [`MeshtasticConfig`] - how to invoke the `meshtastic` CLI and reach the radio
//! - [`MonitorConfig`] - poll cadence and per-node traceroute behaviour
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use meshwatch::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Polling every {}s", config.monitor.update_interval_secs);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [meshtastic]
//! cli_path = "meshtastic"
//! port = "/dev/ttyUSB0"
//! traceroute_timeout_secs = 15
//! command_timeout_secs = 90
//!
//! [monitor]
//! update_interval_secs = 60
//! traceroute_new_nodes = true
//!
//! [logging]
//! level = "info"
//! file = "meshwatch.log"
//! ```
//!
//! Only `[meshtastic]` and `[logging]` need to be present; every other key has a default.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub meshtastic: MeshtasticConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshtasticConfig {
    /// Program name or path of the Meshtastic CLI.
    #[serde(default = "default_cli_path")]
    pub cli_path: String,
    /// Serial device passed as `--port`. Unset lets the CLI autodetect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Network radio address passed as `--host`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Passed to the CLI as `--timeout` for traceroutes.
    #[serde(default = "default_traceroute_timeout_secs")]
    pub traceroute_timeout_secs: u64,
    /// Hard upper bound per CLI invocation; the child is killed past it. 0 disables.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between the start of consecutive poll cycles.
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,
    /// Trace the radio path to every node that newly appears.
    #[serde(default = "default_traceroute_new_nodes")]
    pub traceroute_new_nodes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_cli_path() -> String {
    "meshtastic".to_string()
}

fn default_traceroute_timeout_secs() -> u64 {
    15
}

fn default_command_timeout_secs() -> u64 {
    90
}

fn default_update_interval_secs() -> u64 {
    60
}

fn default_traceroute_new_nodes() -> bool {
    true
}

impl Default for MeshtasticConfig {
    fn default() -> Self {
        Self {
            cli_path: default_cli_path(),
            port: None,
            host: None,
            traceroute_timeout_secs: default_traceroute_timeout_secs(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: default_update_interval_secs(),
            traceroute_new_nodes: default_traceroute_new_nodes(),
        }
    }
}

impl LoggingConfig {
    /// Configured level as a filter; unknown names fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        config.validate()?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.monitor.update_interval_secs == 0 {
            return Err(anyhow!("monitor.update_interval_secs must be greater than 0"));
        }
        if self.meshtastic.cli_path.trim().is_empty() {
            return Err(anyhow!("meshtastic.cli_path must not be empty"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            meshtastic: MeshtasticConfig::default(),
            monitor: MonitorConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("meshwatch.log".to_string()),
            },
        }
    }
}
