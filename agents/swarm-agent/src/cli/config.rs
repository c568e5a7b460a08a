//! Configuration module
//!
//! Handles loading and validating swarm configuration from TOML files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::agent::swarm::SwarmSettings;

/// Main configuration structure for the swarm agent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// REST server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Settings applied to every simulated agent
    #[serde(default)]
    pub agent: AgentsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// REST server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Per-agent timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Reboot marker polling interval in milliseconds
    #[serde(default = "default_reboot_poll_interval")]
    pub reboot_poll_interval_ms: u64,

    /// Step polling interval when the controller does not supply one
    #[serde(default = "default_instruction_interval")]
    pub default_instruction_interval_secs: u64,

    /// Delay between an exit request and process termination
    #[serde(default = "default_exit_grace")]
    pub exit_grace_ms: u64,

    /// Timeout for requests to the installation service
    #[serde(default = "default_controller_timeout")]
    pub controller_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5566
}

fn default_reboot_poll_interval() -> u64 {
    1000
}

fn default_instruction_interval() -> u64 {
    60
}

fn default_exit_grace() -> u64 {
    500
}

fn default_controller_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            reboot_poll_interval_ms: default_reboot_poll_interval(),
            default_instruction_interval_secs: default_instruction_interval(),
            exit_grace_ms: default_exit_grace(),
            controller_timeout_secs: default_controller_timeout(),
        }
    }
}

impl AgentsConfig {
    /// Reject timings that would stall or spin the agents
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("reboot_poll_interval_ms", self.reboot_poll_interval_ms),
            (
                "default_instruction_interval_secs",
                self.default_instruction_interval_secs,
            ),
            ("controller_timeout_secs", self.controller_timeout_secs),
        ];
        for (name, value) in fields {
            if value == 0 {
                bail!("agent.{name} must be greater than zero");
            }
        }
        Ok(())
    }

    pub fn settings(&self) -> SwarmSettings {
        SwarmSettings {
            reboot_poll_interval: Duration::from_millis(self.reboot_poll_interval_ms),
            default_instruction_interval: Duration::from_secs(
                self.default_instruction_interval_secs,
            ),
            exit_grace: Duration::from_millis(self.exit_grace_ms),
        }
    }

    pub fn controller_timeout(&self) -> Duration {
        Duration::from_secs(self.controller_timeout_secs)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .agent
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load the file if it exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default_config())
        }
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.bind_address(), "127.0.0.1:5566");
        assert_eq!(config.agent.reboot_poll_interval_ms, 1000);
        assert_eq!(config.agent.exit_grace_ms, 500);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml_content = r#"
            [server]
            port = 7000
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.agent.default_instruction_interval_secs, 60);
    }

    #[test]
    fn test_settings_durations() {
        let settings = AgentsConfig::default().settings();
        assert_eq!(settings.reboot_poll_interval, Duration::from_secs(1));
        assert_eq!(settings.default_instruction_interval, Duration::from_secs(60));
        assert_eq!(settings.exit_grace, Duration::from_millis(500));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swarm.toml");

        let mut config = Config::default_config();
        config.agent.controller_timeout_secs = 5;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.agent.controller_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_timings_are_rejected() {
        assert!(AgentsConfig::default().validate().is_ok());

        for field in [
            "reboot_poll_interval_ms",
            "default_instruction_interval_secs",
            "controller_timeout_secs",
        ] {
            let config: Config = toml::from_str(&format!("[agent]\n{field} = 0\n")).unwrap();
            let err = config.agent.validate().unwrap_err();
            assert!(err.to_string().contains(field));
        }
    }

    #[test]
    fn test_load_rejects_zero_poll_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swarm.toml");
        std::fs::write(&path, "[agent]\nreboot_poll_interval_ms = 0\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("agent.reboot_poll_interval_ms must be greater than zero"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_or_default("/nonexistent/swarm.toml").unwrap();
        assert_eq!(config.server.port, 5566);
    }
}
