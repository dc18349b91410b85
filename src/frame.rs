//! One read cycle against the link: connect if needed, pull at most one line,
//! decode it, update the cache.
//!
//! Lines are `\n`-terminated UTF-8. Bytes read past a delimiter stay in the
//! reader's buffer for the next cycle. After a frame is abandoned (timed out
//! mid-line or too long) the reader drops input up to the next delimiter so
//! the tail of the broken line is never mistaken for a new one.

use crate::cache::ReadingCache;
use crate::error::BridgeError;
use crate::link::LinkManager;
use crate::metrics::BridgeMetrics;
use crate::port::SerialPortAdapter;
use crate::reading::{decode, Reading};
use memchr::memchr;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default upper bound on a single line.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 4096;

const READ_CHUNK: usize = 256;

/// Why received bytes did not form a usable line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The line did not complete before the read timeout.
    #[error("no line delimiter received within {0:?}")]
    Incomplete(Duration),

    /// The line grew past the configured bound.
    #[error("frame exceeds {limit} bytes")]
    Oversized { limit: usize },

    /// The line is not valid UTF-8.
    #[error("frame is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

#[derive(Debug)]
pub struct FrameReader {
    buffer: Vec<u8>,
    read_timeout: Duration,
    max_frame_bytes: usize,
    /// Dropping input until the next delimiter.
    resyncing: bool,
}

impl FrameReader {
    pub fn new(read_timeout: Duration, max_frame_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            read_timeout,
            max_frame_bytes,
            resyncing: false,
        }
    }

    /// Bytes received but not yet consumed as a line.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Forget partial input; used whenever the channel is replaced.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.resyncing = false;
    }

    /// Run one read cycle and return the reading callers should see.
    ///
    /// Never fails: a broken link, an empty line or a bad frame all yield the
    /// cached reading. Transport errors additionally discard the channel so
    /// the next cycle reconnects.
    pub fn poll(
        &mut self,
        link: &mut LinkManager,
        cache: &ReadingCache,
        metrics: &BridgeMetrics,
    ) -> Reading {
        match self.next_reading(link) {
            Ok(Some(reading)) => {
                info!(reading = %reading.encode(), "New reading");
                cache.set(reading.clone());
                metrics.record_frame_accepted();
                reading
            }
            Ok(None) => cache.get(),
            Err(BridgeError::Transport(cause)) => {
                link.discard(&cause);
                self.reset();
                cache.get()
            }
            Err(e) if e.is_rejected_frame() => {
                metrics.record_frame_rejected();
                warn!(error = %e, "Discarding invalid frame from sensor");
                cache.get()
            }
            // Connect failures are logged by the link manager.
            Err(_) => cache.get(),
        }
    }

    fn next_reading(&mut self, link: &mut LinkManager) -> Result<Option<Reading>, BridgeError> {
        if !link.is_open() {
            self.reset();
            link.try_connect()?;
        }
        let Some(port) = link.handle_mut() else {
            return Ok(None);
        };

        if self.buffer.is_empty() && port.bytes_to_read()? == 0 {
            debug!("No data waiting on serial port");
            return Ok(None);
        }

        let Some(line) = self.read_line(port)? else {
            return Ok(None);
        };
        let text = std::str::from_utf8(&line).map_err(FrameError::from)?.trim();
        if text.is_empty() {
            return Ok(None);
        }

        Ok(Some(decode(text)?))
    }

    /// Read until one complete line is buffered, or the read timeout expires.
    ///
    /// Each read is capped at the time left before the deadline, so a cycle
    /// never blocks longer than one read timeout in total.
    ///
    /// The returned line excludes the delimiter. `Ok(None)` means nothing
    /// worth decoding arrived.
    fn read_line(
        &mut self,
        port: &mut dyn SerialPortAdapter,
    ) -> Result<Option<Vec<u8>>, BridgeError> {
        let deadline = Instant::now() + self.read_timeout;
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if let Some(end) = memchr(b'\n', &self.buffer) {
                let rest = self.buffer.split_off(end + 1);
                let mut line = std::mem::replace(&mut self.buffer, rest);
                line.truncate(end);

                if self.resyncing {
                    self.resyncing = false;
                    debug!(dropped = line.len(), "Resynchronised on line delimiter");
                    if self.buffer.is_empty() && port.bytes_to_read()? == 0 {
                        return Ok(None);
                    }
                    continue;
                }
                if line.len() > self.max_frame_bytes {
                    return Err(self.oversized().into());
                }
                return Ok(Some(line));
            }

            if self.resyncing {
                self.buffer.clear();
            } else if self.buffer.len() > self.max_frame_bytes {
                self.abandon_frame();
                return Err(self.oversized().into());
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                self.abandon_frame();
                return Err(FrameError::Incomplete(self.read_timeout).into());
            }

            // A blocking read must not outlive the cycle's deadline.
            port.set_timeout(remaining)?;
            match port.read_bytes(&mut chunk) {
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(e) if e.is_idle() => std::thread::yield_now(),
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn abandon_frame(&mut self) {
        self.buffer.clear();
        self.resyncing = true;
    }

    fn oversized(&self) -> FrameError {
        FrameError::Oversized {
            limit: self.max_frame_bytes,
        }
    }
}
