//! Serial link lifecycle: open, close, reconnect-with-retry.
//!
//! The manager owns at most one channel handle. Dropping the handle closes
//! the underlying descriptor, so every path that replaces or discards it
//! releases the old resource before a new one is acquired.

use crate::error::BridgeError;
use crate::metrics::BridgeMetrics;
use crate::port::{PortAdapter, PortConfiguration, PortError, PortOpener, SerialPortAdapter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

/// Connection state as seen by status callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// The last `connect()` exhausted its retries.
    Faulted,
}

/// How hard `connect()` tries before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total open attempts per `connect()`, at least one.
    pub attempts: u32,
    /// Fixed pause between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Everything needed to (re)open the sensor's channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    pub port_name: String,
    pub port: PortConfiguration,
    pub retry: RetryPolicy,
}

pub struct LinkManager {
    opener: Box<dyn PortOpener>,
    settings: LinkSettings,
    handle: Option<PortAdapter>,
    metrics: Arc<BridgeMetrics>,
}

impl LinkManager {
    pub fn new(
        opener: Box<dyn PortOpener>,
        settings: LinkSettings,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        metrics.set_link_state(LinkState::Disconnected);
        Self {
            opener,
            settings,
            handle: None,
            metrics,
        }
    }

    /// (Re)open the channel, reporting only whether it worked.
    pub fn connect(&mut self) -> bool {
        self.try_connect().is_ok()
    }

    /// (Re)open the channel.
    ///
    /// Any open channel is closed first. Open attempts are retried up to the
    /// policy's bound with a fixed delay in between; there is no delay after
    /// the last failure. On failure the state is `Faulted` and no channel is
    /// open.
    pub fn try_connect(&mut self) -> Result<(), BridgeError> {
        self.close();

        let attempts = self.settings.retry.attempts.max(1);
        let mut attempt = 1;
        let last_error = loop {
            self.metrics.set_link_state(LinkState::Connecting);
            self.metrics.record_connect_attempt();

            match self.opener.open(&self.settings.port_name, &self.settings.port) {
                Ok(handle) => {
                    info!(
                        port = %self.settings.port_name,
                        baud_rate = self.settings.port.baud_rate,
                        attempt,
                        "Connected to sensor"
                    );
                    self.handle = Some(handle);
                    self.metrics.set_link_state(LinkState::Connected);
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        port = %self.settings.port_name,
                        "Attempt {}/{}: failed to open serial port: {}",
                        attempt,
                        attempts,
                        e
                    );
                    if attempt >= attempts {
                        break e;
                    }
                }
            }

            if !self.settings.retry.delay.is_zero() {
                thread::sleep(self.settings.retry.delay);
            }
            attempt += 1;
        };

        self.metrics.set_link_state(LinkState::Faulted);
        self.metrics.record_connect_failure();
        error!(
            port = %self.settings.port_name,
            attempts,
            "Giving up on serial port until the next request"
        );

        Err(BridgeError::Connect {
            port: self.settings.port_name.clone(),
            attempts,
            source: last_error,
        })
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Release the channel if one is open. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            info!(port = %handle.name(), "Closing serial port");
            drop(handle);
            self.metrics.set_link_state(LinkState::Disconnected);
        }
    }

    /// Throw away a channel that failed mid-session.
    ///
    /// The next poll will go through `connect()` again.
    pub fn discard(&mut self, cause: &PortError) {
        self.handle = None;
        self.metrics.record_transport_error();
        self.metrics.set_link_state(LinkState::Disconnected);
        error!(
            port = %self.settings.port_name,
            error = %cause,
            "Serial communication error; dropping connection"
        );
    }

    /// The open channel, if any.
    pub fn handle_mut(&mut self) -> Option<&mut (dyn SerialPortAdapter + 'static)> {
        self.handle.as_deref_mut()
    }

    pub fn state(&self) -> LinkState {
        self.metrics.link_state()
    }

    pub fn port_name(&self) -> &str {
        &self.settings.port_name
    }

    pub fn baud_rate(&self) -> u32 {
        self.settings.port.baud_rate
    }
}

impl std::fmt::Debug for LinkManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkManager")
            .field("port_name", &self.settings.port_name)
            .field("state", &self.state())
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{MockOpener, MockSerialPort};
    use std::time::Instant;

    fn settings(attempts: u32, delay: Duration) -> LinkSettings {
        LinkSettings {
            port_name: "MOCK0".to_string(),
            port: PortConfiguration::default(),
            retry: RetryPolicy { attempts, delay },
        }
    }

    fn manager(opener: &MockOpener, attempts: u32) -> LinkManager {
        LinkManager::new(
            Box::new(opener.clone()),
            settings(attempts, Duration::ZERO),
            Arc::new(BridgeMetrics::default()),
        )
    }

    #[test]
    fn test_starts_disconnected() {
        let opener = MockOpener::new(MockSerialPort::new("MOCK0"));
        let link = manager(&opener, 3);
        assert!(!link.is_open());
        assert_eq!(link.state(), LinkState::Disconnected);
        assert_eq!(link.port_name(), "MOCK0");
        assert_eq!(link.baud_rate(), 115_200);
        assert_eq!(opener.open_calls(), 0);
    }

    #[test]
    fn test_connect_first_try() {
        let opener = MockOpener::new(MockSerialPort::new("MOCK0"));
        let mut link = manager(&opener, 3);

        assert!(link.connect());
        assert!(link.is_open());
        assert_eq!(link.state(), LinkState::Connected);
        assert_eq!(opener.open_calls(), 1);
    }

    #[test]
    fn test_connect_succeeds_on_third_attempt() {
        let opener = MockOpener::failing_first(MockSerialPort::new("MOCK0"), 2);
        let mut link = manager(&opener, 3);

        assert!(link.connect());
        assert_eq!(opener.open_calls(), 3);
        assert_eq!(link.state(), LinkState::Connected);
    }

    #[test]
    fn test_connect_exhausts_retries() {
        let opener = MockOpener::always_failing(MockSerialPort::new("MOCK0"));
        let mut link = manager(&opener, 3);

        match link.try_connect() {
            Err(BridgeError::Connect { port, attempts, .. }) => {
                assert_eq!(port, "MOCK0");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected connect error, got {:?}", other),
        }
        assert_eq!(opener.open_calls(), 3);
        assert!(!link.is_open());
        assert_eq!(link.state(), LinkState::Faulted);
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let opener = MockOpener::new(MockSerialPort::new("MOCK0"));
        let mut link = manager(&opener, 0);
        assert!(link.connect());
        assert_eq!(opener.open_calls(), 1);
    }

    #[test]
    fn test_reconnect_releases_old_handle_first() {
        let opener = MockOpener::new(MockSerialPort::new("MOCK0"));
        let mut link = manager(&opener, 3);

        for _ in 0..4 {
            assert!(link.connect());
        }
        assert_eq!(opener.live_handles(), 1);
        assert_eq!(opener.peak_live_handles(), 1);
    }

    #[test]
    fn test_failed_reconnect_leaves_nothing_open() {
        let opener = MockOpener::new(MockSerialPort::new("MOCK0"));
        let mut link = manager(&opener, 2);
        assert!(link.connect());

        opener.fail_next(2);
        assert!(!link.connect());
        assert!(!link.is_open());
        assert_eq!(opener.live_handles(), 0);
        assert_eq!(link.state(), LinkState::Faulted);
    }

    #[test]
    fn test_close_is_idempotent() {
        let opener = MockOpener::new(MockSerialPort::new("MOCK0"));
        let mut link = manager(&opener, 3);
        assert!(link.connect());

        link.close();
        link.close();
        assert!(!link.is_open());
        assert_eq!(link.state(), LinkState::Disconnected);
        assert_eq!(opener.live_handles(), 0);
    }

    #[test]
    fn test_discard_after_transport_error() {
        let opener = MockOpener::new(MockSerialPort::new("MOCK0"));
        let metrics = Arc::new(BridgeMetrics::default());
        let mut link = LinkManager::new(
            Box::new(opener.clone()),
            settings(3, Duration::ZERO),
            Arc::clone(&metrics),
        );
        assert!(link.connect());

        link.discard(&PortError::disconnected("MOCK0"));
        assert!(!link.is_open());
        assert_eq!(link.state(), LinkState::Disconnected);
        assert_eq!(metrics.snapshot().transport_errors, 1);
        assert_eq!(opener.live_handles(), 0);
    }

    #[test]
    fn test_retry_delay_only_between_attempts() {
        let opener = MockOpener::always_failing(MockSerialPort::new("MOCK0"));
        let mut link = LinkManager::new(
            Box::new(opener.clone()),
            settings(3, Duration::from_millis(200)),
            Arc::new(BridgeMetrics::default()),
        );

        let started = Instant::now();
        assert!(!link.connect());
        let elapsed = started.elapsed();

        // Two pauses, not three.
        assert!(elapsed >= Duration::from_millis(400), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(600), "{:?}", elapsed);
    }
}
