//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SENSOR_BRIDGE";

/// Config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SENSOR_BRIDGE_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `SENSOR_BRIDGE_CONFIG` environment variable (explicit path)
    /// 2. `./config.toml` (current directory)
    /// 3. `config.toml` in the platform config directory
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override file values; the result is validated.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Platform config directory
    get_default_config_path().filter(|path| path.exists())
}

/// Get the platform config directory for this application.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sensor-bridge").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrite `target` with the parsed value of `SENSOR_BRIDGE_<suffix>`, if set.
fn override_from_env<T: FromStr>(
    suffix: &str,
    target: &mut T,
    expected: &'static str,
) -> ConfigResult<()> {
    let var = format!("{}_{}", ENV_PREFIX, suffix);
    if let Ok(value) = std::env::var(&var) {
        match value.trim().parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => {
                return Err(ConfigError::Env {
                    var,
                    value,
                    expected,
                })
            }
        }
    }
    Ok(())
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `SENSOR_BRIDGE_<SECTION>_<KEY>`
/// For example:
/// - `SENSOR_BRIDGE_SERIAL_PORT=/dev/ttyUSB0`
/// - `SENSOR_BRIDGE_LINK_RETRY_ATTEMPTS=5`
/// - `SENSOR_BRIDGE_SERVER_CORS_ORIGIN=http://dashboard.local`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Server overrides
    override_from_env("SERVER_HOST", &mut config.server.host, "host")?;
    override_from_env("SERVER_PORT", &mut config.server.port, "port number")?;
    override_from_env("SERVER_CORS_ORIGIN", &mut config.server.cors_origin, "origin")?;

    // Serial overrides
    override_from_env("SERIAL_PORT", &mut config.serial.port, "port name")?;
    override_from_env("SERIAL_BAUD_RATE", &mut config.serial.baud_rate, "baud rate")?;
    override_from_env(
        "SERIAL_READ_TIMEOUT_MS",
        &mut config.serial.read_timeout_ms,
        "timeout",
    )?;
    override_from_env(
        "SERIAL_MAX_FRAME_BYTES",
        &mut config.serial.max_frame_bytes,
        "frame size",
    )?;

    // Link overrides
    override_from_env(
        "LINK_RETRY_ATTEMPTS",
        &mut config.link.retry_attempts,
        "attempt count",
    )?;
    override_from_env("LINK_RETRY_DELAY_MS", &mut config.link.retry_delay_ms, "delay")?;

    // Logging overrides
    override_from_env("LOGGING_LEVEL", &mut config.logging.level, "log level")?;
    override_from_env("LOGGING_FORMAT", &mut config.logging.format, "log format")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_no_env_leaves_defaults() {
        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("SENSOR_BRIDGE_SERVER_PORT", "9999");
        env::set_var("SENSOR_BRIDGE_SERIAL_PORT", "COM3");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);
        env::remove_var("SENSOR_BRIDGE_SERVER_PORT");
        env::remove_var("SENSOR_BRIDGE_SERIAL_PORT");

        result.unwrap();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.serial.port, "COM3");
    }

    #[test]
    #[serial]
    fn test_invalid_env_value_is_reported() {
        env::set_var("SENSOR_BRIDGE_LINK_RETRY_ATTEMPTS", "lots");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);
        env::remove_var("SENSOR_BRIDGE_LINK_RETRY_ATTEMPTS");

        match result {
            Err(ConfigError::Env { var, value, .. }) => {
                assert_eq!(var, "SENSOR_BRIDGE_LINK_RETRY_ATTEMPTS");
                assert_eq!(value, "lots");
            }
            other => panic!("expected env parse error, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_load_from_missing_file() {
        let result = ConfigLoader::load_from("/definitely/not/here/config.toml");
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
