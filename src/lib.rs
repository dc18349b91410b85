//! Serial Sensor Bridge Library
//!
//! Reads newline-delimited JSON readings from a serial-attached sensor and
//! keeps the last good one available to HTTP clients.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support
//! - `port`: Port abstraction layer for serial communication
//! - `link`: Connection lifecycle with bounded retry
//! - `frame`: Line framing on top of an open link
//! - `reading`: Reading model and JSON line decoding
//! - `cache`: Last-known-reading cache
//! - `service`: Shared service handle used by front ends
//! - `rest_api`: HTTP handlers (when `rest-api` feature is enabled)

pub mod cache;
pub mod config;
pub mod error;
pub mod frame;
pub mod link;
pub mod logging;
pub mod metrics;
pub mod port;
pub mod reading;
pub mod service;

#[cfg(feature = "rest-api")]
pub mod rest_api;

// Re-export commonly used types for convenience
pub use cache::{CachedReading, ReadingCache};
pub use error::BridgeError;
pub use frame::{FrameError, FrameReader};
pub use link::{LinkManager, LinkSettings, LinkState, RetryPolicy};
pub use metrics::{BridgeMetrics, MetricsSnapshot};
pub use port::{
    MockOpener, MockSerialPort, PortConfiguration, PortError, PortOpener, SerialOpener,
    SerialPortAdapter, SyncSerialPort,
};
pub use reading::{decode, DecodeError, Reading};
pub use service::{BridgeSettings, ConnectResult, SensorService, StatusResult};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
