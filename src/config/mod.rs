//! Configuration module for the sensor bridge.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SENSOR_BRIDGE_CONFIG` environment variable (explicit path)
//! 2. `./config.toml` (current directory)
//! 3. `config.toml` under the platform config directory
//!    (`~/.config/sensor-bridge/` on Linux, `%APPDATA%\sensor-bridge\config\` on Windows)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Any configuration value can be overridden via environment variables.
//! The pattern is: `SENSOR_BRIDGE_<SECTION>_<KEY>`
//!
//! Examples:
//! - `SENSOR_BRIDGE_SERIAL_PORT=/dev/ttyUSB0`
//! - `SENSOR_BRIDGE_SERIAL_BAUD_RATE=9600`
//! - `SENSOR_BRIDGE_LINK_RETRY_DELAY_MS=500`
//!
//! # Example
//!
//! ```rust,no_run
//! use serial_sensor_bridge::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//!
//! println!("Device: {} @ {} baud", config.serial.port, config.serial.baud_rate);
//! # Ok::<(), serial_sensor_bridge::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{
    default_port_name, Config, LinkConfig, LogFormat, LoggingConfig, SerialConfig, ServerConfig,
};
