//! Mock serial port implementation for testing.
//!
//! `MockSerialPort` simulates a sensor without hardware: tests enqueue bytes
//! the "device" emits and can pull the plug at any point. `MockOpener` hands
//! out handles to a shared mock port and can be scripted to fail a number of
//! open attempts first.

use super::error::PortError;
use super::traits::{PortAdapter, PortConfiguration, PortOpener, SerialPortAdapter};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Simulates the device being unplugged.
    disconnected: bool,
    /// Number of `read_bytes` calls, successful or not.
    read_calls: u64,
    /// Most recent timeout passed to `set_timeout`.
    last_timeout: Option<Duration>,
}

/// Mock serial port for testing.
///
/// Clones share the same underlying state, so a test can keep one clone to
/// feed data while the link manager owns another.
///
/// # Example
/// ```
/// use serial_sensor_bridge::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_line(r#"{"temperatura":21}"#);
///
/// let mut buffer = [0u8; 64];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"{\"temperatura\":21}\n");
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState::default())),
        }
    }

    /// Enqueue raw bytes to be returned by subsequent reads.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Enqueue one newline-terminated line.
    pub fn enqueue_line(&mut self, line: &str) {
        let mut state = self.state.lock();
        state.read_queue.extend(line.as_bytes());
        state.read_queue.push_back(b'\n');
    }

    /// Make every further operation fail as if the cable was pulled.
    pub fn disconnect(&mut self) {
        self.state.lock().disconnected = true;
    }

    /// Plug the device back in.
    pub fn reconnect(&mut self) {
        self.state.lock().disconnected = false;
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// Number of read calls made against this port (across all clones).
    pub fn read_calls(&self) -> u64 {
        self.state.lock().read_calls
    }

    /// The timeout the next read would block for, if one was set.
    pub fn last_timeout(&self) -> Option<Duration> {
        self.state.lock().last_timeout
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        state.read_calls += 1;

        if state.disconnected {
            return Err(PortError::disconnected(&self.name));
        }

        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            match state.read_queue.pop_front() {
                Some(queued) => {
                    *byte = queued;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        if bytes_read == 0 {
            // Simulate "would block" behavior by returning an I/O error
            Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "No data available",
            )))
        } else {
            Ok(bytes_read)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if state.disconnected {
            return Err(PortError::disconnected(&self.name));
        }
        state.last_timeout = Some(timeout);
        Ok(())
    }

    fn bytes_to_read(&self) -> Result<usize, PortError> {
        let state = self.state.lock();
        if state.disconnected {
            return Err(PortError::disconnected(&self.name));
        }
        Ok(state.read_queue.len())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

/// A handle given out by [`MockOpener`]; tracks how many are alive at once.
#[derive(Debug)]
struct MockHandle {
    port: MockSerialPort,
    live: Arc<AtomicUsize>,
}

impl SerialPortAdapter for MockHandle {
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.port.read_bytes(buffer)
    }

    fn name(&self) -> &str {
        self.port.name()
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.port.set_timeout(timeout)
    }

    fn bytes_to_read(&self) -> Result<usize, PortError> {
        self.port.bytes_to_read()
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct OpenerCounters {
    /// Open attempts still to fail before one succeeds.
    failures_remaining: AtomicU32,
    /// Every call to `open`.
    open_calls: AtomicU32,
    /// Handles currently alive.
    live: Arc<AtomicUsize>,
    /// Highest number of simultaneously alive handles ever seen.
    peak_live: AtomicUsize,
}

/// Scriptable [`PortOpener`] handing out clones of one [`MockSerialPort`].
#[derive(Debug, Clone)]
pub struct MockOpener {
    port: MockSerialPort,
    always_fail: bool,
    counters: Arc<OpenerCounters>,
}

impl MockOpener {
    /// An opener that always succeeds.
    pub fn new(port: MockSerialPort) -> Self {
        Self {
            port,
            always_fail: false,
            counters: Arc::new(OpenerCounters::default()),
        }
    }

    /// An opener whose first `failures` attempts fail.
    pub fn failing_first(port: MockSerialPort, failures: u32) -> Self {
        let opener = Self::new(port);
        opener
            .counters
            .failures_remaining
            .store(failures, Ordering::SeqCst);
        opener
    }

    /// An opener that never succeeds (device absent).
    pub fn always_failing(port: MockSerialPort) -> Self {
        Self {
            always_fail: true,
            ..Self::new(port)
        }
    }

    /// Make the next `failures` attempts fail.
    pub fn fail_next(&self, failures: u32) {
        self.counters
            .failures_remaining
            .store(failures, Ordering::SeqCst);
    }

    /// Total number of open attempts so far.
    pub fn open_calls(&self) -> u32 {
        self.counters.open_calls.load(Ordering::SeqCst)
    }

    /// Handles currently alive.
    pub fn live_handles(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    /// Highest number of handles that were ever alive at the same time.
    pub fn peak_live_handles(&self) -> usize {
        self.counters.peak_live.load(Ordering::SeqCst)
    }

    /// The shared mock port, for feeding data.
    pub fn port(&self) -> MockSerialPort {
        self.port.clone()
    }
}

impl PortOpener for MockOpener {
    fn open(&self, port_name: &str, _config: &PortConfiguration) -> Result<PortAdapter, PortError> {
        let counters = &self.counters;
        counters.open_calls.fetch_add(1, Ordering::SeqCst);

        if self.always_fail {
            return Err(PortError::not_found(port_name));
        }
        let scripted_failure = counters
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_failure {
            return Err(PortError::not_found(port_name));
        }

        let live = counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak_live.fetch_max(live, Ordering::SeqCst);

        Ok(Box::new(MockHandle {
            port: self.port.clone(),
            live: Arc::clone(&counters.live),
        }))
    }
}
