//! TOML configuration for the driver and the monitor binary.
//!
//! The configuration is read-only: the driver never writes it back.  Every
//! field has a default, so an empty file (or no file at all) yields a working
//! setup for a validator on the first USB serial adapter:
//!
//! ```toml
//! log_level = "info"
//!
//! [port]
//! port_name = "/dev/ttyUSB0"
//! baud_rate = 9600
//! data_bits = 8
//! stop_bits = 1
//! parity = "none"
//! read_timeout_ms = 1000
//!
//! [protocol]
//! step_delay_ms = 528
//! strict_checksum = false
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` take the value of
//! `some_fn()` when they are absent from the file.  Older config files keep
//! working when new fields are added.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ccnet_core::ChecksumMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::infrastructure::transport::PortSettings;

/// Error type for configuration loading.
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

/// Top-level driver configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverConfig {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub port: PortSettings,
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

/// Timing and validation settings for the CCNET exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProtocolConfig {
    /// Pause after every command and every status read, in milliseconds.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    /// Verify sync, length and CRC of poll replies and NAK corrupted ones.
    #[serde(default)]
    pub strict_checksum: bool,
}

impl ProtocolConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn checksum_mode(&self) -> ChecksumMode {
        if self.strict_checksum {
            ChecksumMode::Strict
        } else {
            ChecksumMode::Lenient
        }
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_step_delay_ms() -> u64 {
    528
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            port: PortSettings::default(),
            protocol: ProtocolConfig::default(),
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay_ms(),
            strict_checksum: false,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses the configuration file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if it is not valid TOML for this schema.
pub fn load_config(path: &Path) -> Result<DriverConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: DriverConfig = toml::from_str(&text)?;
    debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Like [`load_config`], but falls back to defaults when no path is given or
/// the file does not exist.
pub fn load_config_or_default(path: Option<&Path>) -> Result<DriverConfig, ConfigError> {
    let Some(path) = path else {
        info!("no config file given; using defaults");
        return Ok(DriverConfig::default());
    };
    match load_config(path) {
        Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            info!("config file {} not found; using defaults", path.display());
            Ok(DriverConfig::default())
        }
        other => other,
    }
}
