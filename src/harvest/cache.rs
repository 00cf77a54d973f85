// src/harvest/cache.rs
//! TTL cache for expensive per-source discovery queries (e.g. locating
//! candidate repositories before listing their issues). The clock is
//! injected so TTL expiry is testable without wall-clock sleeps.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix-seconds clock seam.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> u64;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Settable clock for deterministic TTL tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn at(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

struct Entry<V> {
    value: V,
    inserted_at: u64,
}

/// Read-mostly cache. Each entry is written atomically as a whole behind
/// the lock, so concurrent adapter tasks never observe a partial entry;
/// expired entries read as misses and are overwritten by the next put.
pub struct DiscoveryCache<V> {
    ttl_secs: u64,
    entries: RwLock<HashMap<String, Entry<V>>>,
}

impl<V: Clone> DiscoveryCache<V> {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, clock: &dyn Clock, key: &str) -> Option<V> {
        let entries = self.entries.read().expect("discovery cache lock poisoned");
        let entry = entries.get(key)?;
        if clock.now_unix().saturating_sub(entry.inserted_at) >= self.ttl_secs {
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn put(&self, clock: &dyn Clock, key: &str, value: V) {
        let mut entries = self.entries.write().expect("discovery cache lock poisoned");
        entries.insert(
            key.to_string(),
            Entry {
                value,
                inserted_at: clock.now_unix(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_within_ttl_miss_after_expiry() {
        let clock = ManualClock::at(1_000);
        let cache: DiscoveryCache<Vec<String>> = DiscoveryCache::new(3_600);

        assert!(cache.get(&clock, "github:repos:rust").is_none());
        cache.put(&clock, "github:repos:rust", vec!["acme/widget".into()]);

        clock.advance(3_599);
        assert_eq!(
            cache.get(&clock, "github:repos:rust"),
            Some(vec!["acme/widget".to_string()])
        );

        clock.advance(1);
        assert!(cache.get(&clock, "github:repos:rust").is_none());
    }

    #[test]
    fn put_overwrites_expired_entry() {
        let clock = ManualClock::at(0);
        let cache: DiscoveryCache<u32> = DiscoveryCache::new(10);
        cache.put(&clock, "k", 1);
        clock.advance(20);
        assert!(cache.get(&clock, "k").is_none());
        cache.put(&clock, "k", 2);
        assert_eq!(cache.get(&clock, "k"), Some(2));
    }

    #[test]
    fn keys_are_independent() {
        let clock = ManualClock::at(0);
        let cache: DiscoveryCache<u32> = DiscoveryCache::new(100);
        cache.put(&clock, "a", 1);
        cache.put(&clock, "b", 2);
        assert_eq!(cache.get(&clock, "a"), Some(1));
        assert_eq!(cache.get(&clock, "b"), Some(2));
    }
}
