//! Counters and link state published for status reporting.
//!
//! Updated by the link manager and frame reader while they hold the bridge
//! lock, read by status requests without taking it.

use crate::link::LinkState;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct BridgeMetrics {
    link_state: Mutex<LinkState>,
    frames_accepted: AtomicU64,
    frames_rejected: AtomicU64,
    transport_errors: AtomicU64,
    connect_attempts: AtomicU64,
    connect_failures: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub frames_accepted: u64,
    pub frames_rejected: u64,
    pub transport_errors: u64,
    /// Individual open attempts, including retries.
    pub connect_attempts: u64,
    /// `connect()` calls that exhausted every retry.
    pub connect_failures: u64,
}

impl BridgeMetrics {
    pub fn link_state(&self) -> LinkState {
        *self.link_state.lock()
    }

    pub(crate) fn set_link_state(&self, state: LinkState) {
        *self.link_state.lock() = state;
    }

    pub(crate) fn record_frame_accepted(&self) {
        self.frames_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_frame_rejected(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_connect_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_connect_failure(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_accepted: self.frames_accepted.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = BridgeMetrics::default();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
        assert_eq!(metrics.link_state(), LinkState::Disconnected);
    }

    #[test]
    fn test_recording() {
        let metrics = BridgeMetrics::default();
        metrics.record_frame_accepted();
        metrics.record_frame_rejected();
        metrics.record_frame_rejected();
        metrics.record_connect_attempt();
        metrics.set_link_state(LinkState::Faulted);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.frames_accepted, 1);
        assert_eq!(snapshot.frames_rejected, 2);
        assert_eq!(snapshot.connect_attempts, 1);
        assert_eq!(snapshot.transport_errors, 0);
        assert_eq!(metrics.link_state(), LinkState::Faulted);
    }
}
