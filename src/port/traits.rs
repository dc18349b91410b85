//! Core traits for serial port abstraction.
//!
//! `SerialPortAdapter` is the open channel, `PortOpener` is how one gets
//! acquired. Real hardware and the mock implement both, so the link manager
//! never knows which one it is driving.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters used to open the sensor's serial channel.
///
/// The sensor firmware speaks 8N1 without flow control, so only the values
/// that actually vary between deployments are carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Upper bound on a single blocking read.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            timeout: Duration::from_secs(2),
        }
    }
}

/// An open serial channel.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read. An expired read timeout is
    /// reported as an error for which [`PortError::is_idle`] is true.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Bound how long the next `read_bytes` may block.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Number of bytes waiting in the receive buffer, without blocking.
    ///
    /// An error here means the channel itself is unusable (typically the
    /// device was unplugged).
    fn bytes_to_read(&self) -> Result<usize, PortError>;
}

/// Boxed channel handle as held by the link manager.
pub type PortAdapter = Box<dyn SerialPortAdapter>;

/// Acquires serial channels.
pub trait PortOpener: Send + std::fmt::Debug {
    /// Open `port_name` with the given configuration.
    fn open(&self, port_name: &str, config: &PortConfiguration) -> Result<PortAdapter, PortError>;
}
