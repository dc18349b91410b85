//! Port abstraction layer for serial communication.
//!
//! Provides the traits the link manager is written against, the real
//! `serialport`-backed implementation, and mocks for tests.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{MockOpener, MockSerialPort};
pub use sync_port::{SerialOpener, SyncSerialPort};
pub use traits::*;
