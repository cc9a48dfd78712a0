//! Configuration management for the Glance host shim.
//!
//! Settings are read from a TOML file. A missing file is replaced by the
//! defaults, written to disk so operators have something to edit.

use glance_core::{VersionIdentifier, DEFAULT_VERSION_ENV};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

fn default_version_env() -> String {
    DEFAULT_VERSION_ENV.to_string()
}

fn default_tick_interval() -> u64 {
    50 // 20 ticks per second
}

fn default_world() -> String {
    "world".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// How the host version is found and how the host is driven
    #[serde(default)]
    pub host: HostSettings,
    /// Which bundled adapters are offered to the loader
    #[serde(default)]
    pub adapters: AdapterSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSettings {
    /// Fixed host version string; when unset the version is read from `version_env`
    #[serde(default)]
    pub version: Option<String>,
    /// Environment variable holding the host version
    #[serde(default = "default_version_env")]
    pub version_env: String,
    /// Host tick interval in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// If set, a text model with this content is spawned once the adapter is bound
    #[serde(default)]
    pub demo_text: Option<String>,
    /// World the demo model is placed in
    #[serde(default = "default_world")]
    pub world: String,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            version: None,
            version_env: default_version_env(),
            tick_interval_ms: default_tick_interval(),
            demo_text: None,
            world: default_world(),
        }
    }
}

/// Adapter selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterSettings {
    /// Adapter labels to register - if empty, every bundled adapter is registered
    #[serde(default)]
    pub allow: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the specified path
    /// and returns the default configuration.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Reads the configuration without creating anything on disk.
    ///
    /// A missing file yields the defaults.
    pub async fn read_if_present(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        Ok(toml::from_str(&content)?)
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(version) = &self.host.version {
            if let Err(e) = VersionIdentifier::parse(version) {
                return Err(format!("Invalid host version override: {e}"));
            }
        }

        if self.host.version_env.trim().is_empty() {
            return Err("Host version environment variable name cannot be empty".to_string());
        }

        if self.host.tick_interval_ms == 0 {
            return Err("Tick interval must be greater than zero".to_string());
        }

        if self.adapters.allow.iter().any(|label| label.trim().is_empty()) {
            return Err("Adapter allow-list entries cannot be empty".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}
