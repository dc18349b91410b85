//! Service layer for the sensor bridge.
//!
//! `SensorService` is constructed once at startup and handed to every front
//! end. It owns the link manager and frame reader behind one lock, so a
//! request's connect-check, read, decode and cache update happen as one unit
//! and never interleave with another request's reconnect.
//!
//! # Architecture
//!
//! ```text
//! REST API ──> SensorService ──> Mutex<{ LinkManager, FrameReader }>
//!                     │                         │
//!                     └──── ReadingCache <──────┘
//! ```
//!
//! Cache reads and status never take the lock, so they stay fast even while
//! a reconnect is sleeping between attempts.

use crate::{
    cache::ReadingCache,
    config::Config,
    frame::FrameReader,
    link::{LinkManager, LinkSettings, LinkState, RetryPolicy},
    metrics::{BridgeMetrics, MetricsSnapshot},
    port::{PortConfiguration, PortOpener},
    reading::Reading,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ========== Settings ==========

/// Everything the service needs to know about the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    pub link: LinkSettings,
    pub max_frame_bytes: usize,
}

impl BridgeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            link: LinkSettings {
                port_name: config.serial.port.clone(),
                port: PortConfiguration {
                    baud_rate: config.serial.baud_rate,
                    timeout: config.serial.read_timeout(),
                },
                retry: RetryPolicy {
                    attempts: config.link.retry_attempts,
                    delay: config.link.retry_delay(),
                },
            },
            max_frame_bytes: config.serial.max_frame_bytes,
        }
    }
}

// ========== Response DTOs ==========

/// Outcome of an explicit reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectResult {
    pub success: bool,
    pub port: String,
}

/// Link health and counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResult {
    pub link_state: LinkState,
    pub port: String,
    pub baud_rate: u32,
    pub last_reading_at: Option<DateTime<Utc>>,
    pub metrics: MetricsSnapshot,
}

// ========== Service Implementation ==========

struct BridgeCore {
    link: LinkManager,
    reader: FrameReader,
}

/// Shared handle to the bridge. Cheap to clone.
#[derive(Clone)]
pub struct SensorService {
    core: Arc<Mutex<BridgeCore>>,
    cache: ReadingCache,
    metrics: Arc<BridgeMetrics>,
    port_name: Arc<str>,
    baud_rate: u32,
}

impl SensorService {
    pub fn new(opener: Box<dyn PortOpener>, settings: BridgeSettings) -> Self {
        let metrics = Arc::new(BridgeMetrics::default());
        let port_name: Arc<str> = Arc::from(settings.link.port_name.as_str());
        let baud_rate = settings.link.port.baud_rate;
        let reader = FrameReader::new(settings.link.port.timeout, settings.max_frame_bytes);
        let link = LinkManager::new(opener, settings.link, Arc::clone(&metrics));

        Self {
            core: Arc::new(Mutex::new(BridgeCore { link, reader })),
            cache: ReadingCache::new(),
            metrics,
            port_name,
            baud_rate,
        }
    }

    /// Run one read cycle and return the best available reading.
    ///
    /// Blocks for at most the retry budget plus one read timeout. Callers on
    /// an async runtime should run this on a blocking thread.
    pub fn poll(&self) -> Reading {
        let mut core = self.core.lock();
        let BridgeCore { link, reader } = &mut *core;
        reader.poll(link, &self.cache, &self.metrics)
    }

    /// Force a reconnect, closing any open channel first.
    pub fn connect(&self) -> ConnectResult {
        let mut core = self.core.lock();
        core.reader.reset();
        let success = core.link.connect();
        ConnectResult {
            success,
            port: self.port_name.to_string(),
        }
    }

    /// The cached reading, without touching the device.
    pub fn latest(&self) -> Reading {
        self.cache.get()
    }

    pub fn status(&self) -> StatusResult {
        StatusResult {
            link_state: self.metrics.link_state(),
            port: self.port_name.to_string(),
            baud_rate: self.baud_rate,
            last_reading_at: self.cache.snapshot().updated_at,
            metrics: self.metrics.snapshot(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.metrics.link_state() == LinkState::Connected
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Close the channel. Used once the server has stopped accepting requests.
    pub fn shutdown(&self) {
        let mut core = self.core.lock();
        core.link.close();
        core.reader.reset();
    }
}

impl std::fmt::Debug for SensorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorService")
            .field("port_name", &self.port_name)
            .field("link_state", &self.metrics.link_state())
            .finish()
    }
}

// ========== Tests ==========
