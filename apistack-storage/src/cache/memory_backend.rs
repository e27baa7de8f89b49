//! In-process cache backend.

use async_trait::async_trait;
use apistack_core::CacheResult;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use super::traits::{CacheStats, ListCache};

/// Default upper bound on stored entries.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Default minimum spacing between expiry sweeps triggered by writes.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    rejected: AtomicU64,
}

/// Concurrent map with lazy expiry and a bounded entry count.
///
/// Expired entries are dropped when read, by [`purge_expired`], and by a
/// sweep that `set` runs at most once per sweep interval. When the map is
/// full after sweeping, new keys are not stored (the read just goes to the
/// store next time). Time comes from `tokio::time`, so paused-clock tests
/// can step past a TTL.
///
/// [`purge_expired`]: InMemoryListCache::purge_expired
#[derive(Debug, Clone)]
pub struct InMemoryListCache {
    entries: Arc<DashMap<String, Entry>>,
    counters: Arc<Counters>,
    max_entries: usize,
    sweep_interval: Duration,
    last_sweep: Arc<Mutex<Instant>>,
}

impl Default for InMemoryListCache {
    fn default() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            counters: Arc::new(Counters::default()),
            max_entries: DEFAULT_MAX_ENTRIES,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            last_sweep: Arc::new(Mutex::new(Instant::now())),
        }
    }
}

impl InMemoryListCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        self.counters
            .expirations
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Claim the sweep slot if the interval has elapsed since the last one.
    fn sweep_due(&self, now: Instant) -> bool {
        let mut last = match self.last_sweep.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if now.duration_since(*last) >= self.sweep_interval {
            *last = now;
            true
        } else {
            false
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            entry_count: self.entries.len() as u64,
            expirations: self.counters.expirations.load(Ordering::Relaxed),
        }
    }

    /// Writes dropped because the cache was full.
    pub fn rejected_writes(&self) -> u64 {
        self.counters.rejected.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ListCache for InMemoryListCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let now = Instant::now();
        let found = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => None,
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
        };

        match found {
            Some(value) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(value))
            }
            None => {
                // Re-check under the shard lock: a concurrent set may have
                // replaced the expired entry.
                if self
                    .entries
                    .remove_if(key, |_, entry| entry.is_expired(now))
                    .is_some()
                {
                    self.counters.expirations.fetch_add(1, Ordering::Relaxed);
                }
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let now = Instant::now();
        if self.sweep_due(now) {
            let removed = self.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "Swept expired list cache entries");
            }
        }

        let full = || self.entries.len() >= self.max_entries;
        if full() && !self.entries.contains_key(key) {
            self.purge_expired();
            if full() {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(max_entries = self.max_entries, "List cache full, entry not stored");
                return Ok(());
            }
        }

        let expires_at = if ttl.is_zero() { None } else { Some(now + ttl) };
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
