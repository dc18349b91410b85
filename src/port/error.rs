//! Port-specific error types.
//!
//! Kept separate from the bridge-level errors so that the transport layer can
//! be tested and mocked without pulling in decoding or HTTP concerns.

use thiserror::Error;

/// Errors that can occur while opening or reading a serial channel.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial device was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred on the open channel.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Port configuration was rejected by the driver.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The device went away while the channel was open.
    #[error("Device disconnected: {0}")]
    Disconnected(String),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Disconnected error for the named port.
    pub fn disconnected(port_name: impl Into<String>) -> Self {
        Self::Disconnected(port_name.into())
    }

    /// Whether this error only means "nothing arrived yet".
    ///
    /// Real ports report an expired read timeout as `TimedOut`; the mock port
    /// reports an empty queue as `WouldBlock`. Neither means the link is gone.
    pub fn is_idle(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}
