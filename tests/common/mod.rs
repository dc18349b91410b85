//! Shared test utilities for the sensor bridge integration tests.
//!
//! Every helper builds a service around a [`MockOpener`] so tests can feed
//! bytes, script open failures and inspect how many handles are alive.

#![allow(dead_code)]

use serial_sensor_bridge::config::Config;
use serial_sensor_bridge::port::{MockOpener, MockSerialPort};
use serial_sensor_bridge::service::{BridgeSettings, SensorService};

pub const MOCK_PORT: &str = "MOCK0";

/// A config with short timeouts so failure paths finish quickly.
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.serial.port = MOCK_PORT.to_string();
    config.serial.read_timeout_ms = 100;
    config.link.retry_delay_ms = 10;
    config
}

/// A service plus the handles a test needs to drive it.
pub struct Harness {
    pub service: SensorService,
    pub opener: MockOpener,
    pub device: MockSerialPort,
}

impl Harness {
    pub fn with_opener(opener: MockOpener, config: &Config) -> Self {
        let device = opener.port();
        let service = SensorService::new(
            Box::new(opener.clone()),
            BridgeSettings::from_config(config),
        );
        Self {
            service,
            opener,
            device,
        }
    }

    /// Device present and healthy.
    pub fn healthy() -> Self {
        Self::with_opener(MockOpener::new(MockSerialPort::new(MOCK_PORT)), &fast_config())
    }

    /// Device whose first `failures` open attempts fail.
    pub fn flaky(failures: u32) -> Self {
        Self::with_opener(
            MockOpener::failing_first(MockSerialPort::new(MOCK_PORT), failures),
            &fast_config(),
        )
    }

    /// Device that never opens.
    pub fn absent() -> Self {
        Self::with_opener(
            MockOpener::always_failing(MockSerialPort::new(MOCK_PORT)),
            &fast_config(),
        )
    }

    /// Queue one newline-terminated line on the device.
    pub fn emit(&mut self, line: &str) {
        self.device.enqueue_line(line);
    }
}
