//! Errors raised while assembling the bridge configuration.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Only reachable through `--print-config`.
    #[error("cannot render configuration: {0}")]
    Render(#[from] toml::ser::Error),

    /// A value parsed but the bridge cannot run with it.
    #[error("{key} {reason}")]
    Invalid { key: &'static str, reason: &'static str },

    #[error("{var}={value:?} is not a valid {expected}")]
    Env {
        var: String,
        value: String,
        expected: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: &'static str) -> Self {
        Self::Invalid { key, reason }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
