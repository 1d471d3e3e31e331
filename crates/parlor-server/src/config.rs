//! Server configuration.
//!
//! Configuration can be loaded from:
//! - TOML configuration file (`--config`, or the first default path found)
//! - Environment variables (`PARLOR_*`, `__` between nested keys)
//!
//! Environment variables override the file; anything unset keeps its default.

use anyhow::{bail, Context, Result};
use parlor_core::SweepConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Files searched, in order, when no path is given.
const CONFIG_PATHS: [&str; 3] = [
    "parlor.toml",
    "/etc/parlor/parlor.toml",
    "~/.config/parlor/parlor.toml",
];

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Presence timing.
    #[serde(default)]
    pub presence: PresenceConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Cross-origin access for browser clients.
    #[serde(default)]
    pub cors: CorsConfig,
}

/// Presence timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Inactivity before a participant is evicted, in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Time between sweeps, in milliseconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_ms: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics export.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Answer preflights and allow requests from any origin.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    10_000 // 10 seconds
}

fn default_sweep_interval() -> u64 {
    15_000 // 15 seconds
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            presence: PresenceConfig::default(),
            metrics: MetricsConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout(),
            sweep_interval_ms: default_sweep_interval(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_metrics_port(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl PresenceConfig {
    /// Timing for the sweep scheduler.
    #[must_use]
    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig {
            interval: Duration::from_millis(self.sweep_interval_ms),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the first default path that
    /// exists, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be parsed, an override has the
    /// wrong type, or the result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        let file = match path {
            Some(path) => Some(path.display().to_string()),
            None => CONFIG_PATHS
                .iter()
                .map(|p| shellexpand::tilde(p).into_owned())
                .find(|p| Path::new(p).exists()),
        };
        if let Some(file) = &file {
            builder = builder.add_source(config::File::new(file, config::FileFormat::Toml));
        }

        let config: Config = builder
            .add_source(
                config::Environment::with_prefix("PARLOR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| match &file {
                Some(file) => format!("Failed to read config file: {file}"),
                None => "Failed to read configuration".to_string(),
            })?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.presence.timeout_ms == 0 {
            bail!("presence.timeout_ms must be positive");
        }
        if self.presence.sweep_interval_ms == 0 {
            bail!("presence.sweep_interval_ms must be positive");
        }
        Ok(())
    }

    /// Get the socket address to bind to.
    ///
    /// # Errors
    ///
    /// Returns an error if host and port do not form a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.presence.timeout_ms, 10_000);
        assert_eq!(config.presence.sweep_interval_ms, 15_000);
        assert!(config.metrics.enabled);
        assert!(config.cors.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr().unwrap().port(), 5000);

        let bad = Config {
            host: "not a host".to_string(),
            ..Config::default()
        };
        assert!(bad.bind_addr().is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            host = "0.0.0.0"
            port = 9000

            [presence]
            timeout_ms = 5000

            [cors]
            enabled = false
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.presence.timeout_ms, 5000);
        assert_eq!(config.presence.sweep_interval_ms, 15_000);
        assert!(!config.cors.enabled);
    }

    #[test]
    fn test_sweep_config() {
        let sweep = PresenceConfig::default().sweep_config();
        assert_eq!(sweep, SweepConfig::default());
    }

    #[test]
    fn test_zero_timing_rejected() {
        let mut config = Config::default();
        config.presence.sweep_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let path = std::env::temp_dir().join(format!("parlor-test-{}.toml", std::process::id()));
        std::fs::write(&path, "port = 6100\n[presence]\nsweep_interval_ms = 2000\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.port, 6100);
        assert_eq!(config.presence.sweep_interval_ms, 2000);
        assert_eq!(config.presence.timeout_ms, 10_000);
    }
}
