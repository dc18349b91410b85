//! Last-known-reading cache.

use crate::reading::Reading;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// The cached reading together with when it arrived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedReading {
    pub reading: Reading,
    /// `None` until the first successful read.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Single-slot store holding the most recent valid reading.
///
/// Starts out holding [`Reading::zero`]. Writes replace the whole slot, so a
/// reader sees either the old reading or the new one, never a mix.
#[derive(Debug, Clone)]
pub struct ReadingCache {
    slot: Arc<RwLock<CachedReading>>,
}

impl ReadingCache {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(RwLock::new(CachedReading {
                reading: Reading::zero(),
                updated_at: None,
            })),
        }
    }

    pub fn get(&self) -> Reading {
        self.slot.read().reading.clone()
    }

    pub fn set(&self, reading: Reading) {
        let next = CachedReading {
            reading,
            updated_at: Some(Utc::now()),
        };
        *self.slot.write() = next;
    }

    pub fn snapshot(&self) -> CachedReading {
        self.slot.read().clone()
    }
}

impl Default for ReadingCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::decode;
    use std::thread;

    #[test]
    fn test_starts_with_zero_reading() {
        let cache = ReadingCache::new();
        assert_eq!(cache.get(), Reading::zero());
        assert!(cache.snapshot().updated_at.is_none());
    }

    #[test]
    fn test_set_replaces_slot() {
        let cache = ReadingCache::new();
        let reading = decode(r#"{"temperatura":30,"umidade":70,"gas":1}"#).unwrap();

        cache.set(reading.clone());

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.reading, reading);
        assert!(snapshot.updated_at.is_some());
    }

    #[test]
    fn test_clones_share_the_slot() {
        let cache = ReadingCache::new();
        let other = cache.clone();
        let reading = decode(r#"{"temperatura":1}"#).unwrap();

        other.set(reading.clone());
        assert_eq!(cache.get(), reading);
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_values() {
        let cache = ReadingCache::new();
        let a = decode(r#"{"temperatura":1,"umidade":1,"gas":1}"#).unwrap();
        let b = decode(r#"{"temperatura":2,"umidade":2,"gas":2}"#).unwrap();

        let writer = {
            let cache = cache.clone();
            let (a, b) = (a.clone(), b.clone());
            thread::spawn(move || {
                for i in 0..500 {
                    cache.set(if i % 2 == 0 { a.clone() } else { b.clone() });
                }
            })
        };

        for _ in 0..500 {
            let seen = cache.get();
            assert!(seen == a || seen == b || seen == Reading::zero());
        }
        writer.join().unwrap();
    }
}
