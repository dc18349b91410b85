//! Error taxonomy of the poll cycle.
//!
//! None of these ever reach an HTTP caller as a failure status: the service
//! turns each of them into "serve the cached reading". They exist so the
//! recovery path can be chosen by matching instead of by guesswork.

use crate::frame::FrameError;
use crate::port::PortError;
use crate::reading::DecodeError;
use thiserror::Error;

/// Everything that can go wrong between "request arrived" and "cache updated".
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The device could not be opened within the retry budget.
    #[error("could not open {port} after {attempts} attempt(s): {source}")]
    Connect {
        port: String,
        attempts: u32,
        #[source]
        source: PortError,
    },

    /// The open channel failed; the handle must be discarded.
    #[error("transport error: {0}")]
    Transport(#[from] PortError),

    /// Bytes arrived but did not form a usable line.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// A complete line arrived but is not a reading.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl BridgeError {
    /// Whether the line was discarded (as opposed to the link failing).
    pub fn is_rejected_frame(&self) -> bool {
        matches!(self, Self::Frame(_) | Self::Decode(_))
    }
}
