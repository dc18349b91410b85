//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::frame::DEFAULT_MAX_FRAME_BYTES;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP façade configuration
    pub server: ServerConfig,
    /// Serial device configuration
    pub serial: SerialConfig,
    /// Reconnect policy
    pub link: LinkConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the bridge cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.port.trim().is_empty() {
            return Err(ConfigError::invalid("serial.port", "must not be empty"));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::invalid(
                "serial.baud_rate",
                "must be greater than zero",
            ));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "serial.read_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.serial.max_frame_bytes == 0 {
            return Err(ConfigError::invalid(
                "serial.max_frame_bytes",
                "must be greater than zero",
            ));
        }
        if self.link.retry_attempts == 0 {
            return Err(ConfigError::invalid(
                "link.retry_attempts",
                "at least one attempt is required",
            ));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// HTTP façade configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port number for HTTP server
    pub port: u16,
    /// The single browser origin allowed by CORS
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

/// Serial device configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path or port name
    pub port: String,
    /// Baud rate the firmware transmits at
    pub baud_rate: u32,
    /// Upper bound on waiting for one line, in milliseconds
    pub read_timeout_ms: u64,
    /// Longest accepted line, in bytes
    pub max_frame_bytes: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port_name().to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 2000,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl SerialConfig {
    /// Get the read timeout as Duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Where the sensor usually shows up on this platform.
pub fn default_port_name() -> &'static str {
    if cfg!(windows) {
        "COM9"
    } else {
        "/dev/ttyACM0"
    }
}

/// Reconnect policy section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Open attempts per connect
    pub retry_attempts: u32,
    /// Pause between attempts, in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay_ms: 2000,
        }
    }
}

impl LinkConfig {
    /// Get the retry delay as Duration
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "serial_sensor_bridge=debug"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}
