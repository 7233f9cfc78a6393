// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Response cache shared by every upstream client
//!
//! [`TtlCache`] is a bounded in-memory map from string keys to decoded
//! upstream responses. Freshness is checked lazily on read; expired entries
//! are still reachable through [`TtlCache::get_stale`] until a read removes
//! them, and [`TtlCache::lookup`] hands the removed value back, so that a
//! rate-limited upstream can be answered from the last known value. When full, the oldest
//! fifth of the keys (by first insertion) is evicted to make room.

use std::{
    collections::{HashMap, VecDeque},
    fmt::{self, Display},
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use shared_types::Upstream;
use tokio::time::Instant;
use tracing::{debug, trace};
use utoipa::ToSchema;

/// Default maximum number of cached responses
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Fraction of the capacity evicted when the cache is full
const EVICTION_FRACTION: f64 = 0.2;

/// Outcome of [`TtlCache::lookup`]
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<V> {
    /// Entry present and within its TTL
    Fresh(CachedValue<V>),
    /// Entry was present but expired; it has been removed
    Expired(V),
    /// No entry
    Missing,
}

/// Cached value together with the upstream `ETag`, if any
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue<V> {
    /// The cached value
    pub value: V,
    /// Entity tag reported by the upstream when the value was stored
    pub etag: Option<String>,
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    etag: Option<String>,
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: u64,
    misses: u64,
    stale_hits: u64,
    stores: u64,
    evictions: u64,
    expirations: u64,
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Keys in first-insertion order, oldest at the front
    order: VecDeque<String>,
    counters: CacheCounters,
}

impl<V> CacheState<V> {
    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        if let Some(position) = self.order.iter().position(|k| k == key) {
            self.order.remove(position);
        }
        Some(entry)
    }
}

/// Bounded TTL cache with stale reads and FIFO eviction
#[derive(Debug)]
pub struct TtlCache<V = serde_json::Value> {
    state: Mutex<CacheState<V>>,
    max_entries: usize,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache holding at most `max_entries` values (minimum 1)
    pub fn new(max_entries: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
                counters: CacheCounters::default(),
            }),
            max_entries: max_entries.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a fresh value
    ///
    /// An entry past its expiry is removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<CachedValue<V>> {
        match self.lookup(key) {
            Lookup::Fresh(hit) => Some(hit),
            Lookup::Expired(_) | Lookup::Missing => None,
        }
    }

    /// Like [`Self::get`], but hands an expired value back to the caller
    /// as it is removed
    ///
    /// The request pipeline keeps that value as its stale fallback for the
    /// duration of one upstream call.
    pub fn lookup(&self, key: &str) -> Lookup<V> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let now = Instant::now();

        let fresh = state
            .entries
            .get(key)
            .map(|entry| (now <= entry.expires_at).then(|| CachedValue {
                value: entry.value.clone(),
                etag: entry.etag.clone(),
            }));

        match fresh {
            Some(Some(hit)) => {
                state.counters.hits += 1;
                trace!(cache_key = key, "cache hit");
                Lookup::Fresh(hit)
            }
            Some(None) => {
                state.counters.expirations += 1;
                state.counters.misses += 1;
                debug!(cache_key = key, "expired cache entry removed");
                match state.remove(key) {
                    Some(entry) => Lookup::Expired(entry.value),
                    None => Lookup::Missing,
                }
            }
            None => {
                state.counters.misses += 1;
                trace!(cache_key = key, "cache miss");
                Lookup::Missing
            }
        }
    }

    /// Store a value for `ttl`, overwriting any previous value for `key`
    ///
    /// Inserting a new key into a full cache first evicts the oldest
    /// `max(1, floor(max_entries * 0.2))` keys. Overwriting never evicts and
    /// keeps the key's original position in the eviction order.
    pub fn set(&self, key: &str, value: V, ttl: Duration, etag: Option<String>) {
        let mut state = self.lock();
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
            etag,
        };

        if let Some(existing) = state.entries.get_mut(key) {
            *existing = entry;
        } else {
            if state.entries.len() >= self.max_entries {
                let evicted = self.evict_oldest(&mut state);
                debug!(
                    evicted,
                    remaining_entries = state.entries.len(),
                    max_entries = self.max_entries,
                    "evicted oldest cache entries due to capacity limit"
                );
            }
            state.entries.insert(key.to_string(), entry);
            state.order.push_back(key.to_string());
        }

        state.counters.stores += 1;
        trace!(
            cache_key = key,
            ttl_ms = ttl.as_millis(),
            size = state.entries.len(),
            "stored value in cache"
        );
    }

    fn evict_oldest(&self, state: &mut CacheState<V>) -> usize {
        let mut evicted = 0;
        for _ in 0..self.eviction_batch() {
            let Some(key) = state.order.pop_front() else {
                break;
            };
            if state.entries.remove(&key).is_some() {
                evicted += 1;
            }
        }
        state.counters.evictions += evicted as u64;
        evicted
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn eviction_batch(&self) -> usize {
        ((self.max_entries as f64 * EVICTION_FRACTION).floor() as usize).max(1)
    }

    /// Get a value regardless of its expiry, without removing it
    pub fn get_stale(&self, key: &str) -> Option<V> {
        let mut state = self.lock();
        let value = state.entries.get(key).map(|entry| entry.value.clone());
        if value.is_some() {
            state.counters.stale_hits += 1;
            trace!(cache_key = key, "stale cache read");
        }
        value
    }

    /// Count a stale value served from a [`Lookup::Expired`] result
    pub(crate) fn record_stale_hit(&self) {
        self.lock().counters.stale_hits += 1;
    }

    /// Remove every entry
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
        debug!("cleared response cache");
    }

    /// Number of stored entries, fresh or expired
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Maximum number of entries
    pub const fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Snapshot of the cache counters
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let counters = &state.counters;
        CacheStats {
            entries: state.entries.len(),
            capacity: self.max_entries,
            hits: counters.hits,
            misses: counters.misses,
            stale_hits: counters.stale_hits,
            stores: counters.stores,
            evictions: counters.evictions,
            expirations: counters.expirations,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CacheStats {
    /// Number of stored entries
    pub entries: usize,
    /// Maximum number of entries
    pub capacity: usize,
    /// Fresh reads
    pub hits: u64,
    /// Reads that found nothing fresh
    pub misses: u64,
    /// Reads served from expired entries after an upstream 429
    pub stale_hits: u64,
    /// Writes
    pub stores: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Entries removed because they expired
    pub expirations: u64,
}

impl CacheStats {
    /// Fraction of reads answered from fresh entries (0.0 to 1.0)
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Builder for colon-delimited cache keys
///
/// Keys follow `<upstream>:<resource>:<params...>` with parameters in the
/// order they are added, e.g. `hiro:transfers:<id>:0:20`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey(String);

impl CacheKey {
    /// Start a key for `resource` on `upstream`
    pub fn new(upstream: Upstream, resource: &str) -> Self {
        Self(format!("{}:{resource}", upstream.cache_prefix()))
    }

    /// Append one parameter
    #[must_use]
    pub fn param(mut self, value: impl Display) -> Self {
        self.0.push(':');
        self.0.push_str(&value.to_string());
        self
    }

    /// Borrow the key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::advance;

    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn fresh_value_is_returned_with_etag() {
        let cache: TtlCache<u32> = TtlCache::new(10);
        cache.set("k", 7, MINUTE, Some("\"v1\"".to_string()));

        advance(Duration::from_secs(59)).await;
        let hit = cache.get("k").unwrap();
        assert_eq!(hit.value, 7);
        assert_eq!(hit.etag.as_deref(), Some("\"v1\""));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_value_is_removed_on_read() {
        let cache: TtlCache<u32> = TtlCache::new(10);
        cache.set("k", 7, MINUTE, None);

        advance(MINUTE + Duration::from_millis(1)).await;
        assert!(cache.get("k").is_none());
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
        assert!(cache.get_stale("k").is_none());

        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_hands_back_expired_value() {
        let cache: TtlCache<u32> = TtlCache::new(10);
        cache.set("k", 7, MINUTE, None);
        assert!(matches!(cache.lookup("k"), Lookup::Fresh(CachedValue { value: 7, .. })));

        advance(MINUTE * 2).await;
        assert_eq!(cache.lookup("k"), Lookup::Expired(7));
        assert_eq!(cache.lookup("k"), Lookup::Missing);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_read_survives_expiry() {
        let cache: TtlCache<&str> = TtlCache::new(10);
        cache.set("k", "old", MINUTE, None);

        advance(MINUTE * 5).await;
        assert_eq!(cache.get_stale("k"), Some("old"));
        assert_eq!(cache.get_stale("k"), Some("old"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().stale_hits, 2);
    }

    #[test]
    fn full_cache_evicts_oldest_fifth() {
        let cache: TtlCache<usize> = TtlCache::new(10);
        for i in 0..10 {
            cache.set(&format!("k{i}"), i, MINUTE, None);
        }
        assert_eq!(cache.len(), 10);

        cache.set("k10", 10, MINUTE, None);

        assert_eq!(cache.len(), 9);
        assert!(cache.get("k0").is_none());
        assert!(cache.get("k1").is_none());
        for i in 2..=10 {
            assert!(cache.get(&format!("k{i}")).is_some(), "k{i} should remain");
        }
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn overwrite_keeps_insertion_position_and_never_evicts() {
        let cache: TtlCache<usize> = TtlCache::new(5);
        for i in 0..5 {
            cache.set(&format!("k{i}"), i, MINUTE, None);
        }

        cache.set("k0", 100, MINUTE, None);
        assert_eq!(cache.len(), 5);
        assert_eq!(cache.stats().evictions, 0);

        cache.set("k5", 5, MINUTE, None);
        assert!(cache.get("k0").is_none());
        assert!(cache.get("k1").is_some());
    }

    #[test]
    fn tiny_cache_still_evicts_one_entry() {
        let cache: TtlCache<u8> = TtlCache::new(2);
        cache.set("a", 1, MINUTE, None);
        cache.set("b", 2, MINUTE, None);
        cache.set("c", 3, MINUTE, None);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("c").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_key_reinserted_goes_to_the_back() {
        let cache: TtlCache<u8> = TtlCache::new(5);
        cache.set("a", 1, Duration::from_secs(1), None);
        for key in ["b", "c", "d", "e"] {
            cache.set(key, 0, MINUTE, None);
        }

        advance(Duration::from_secs(2)).await;
        assert!(cache.get("a").is_none());
        cache.set("a", 2, MINUTE, None);
        cache.set("f", 0, MINUTE, None);

        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("a").map(|hit| hit.value), Some(2));
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache: TtlCache<u8> = TtlCache::default();
        cache.set("a", 1, MINUTE, None);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), DEFAULT_MAX_ENTRIES);
    }

    #[test]
    fn hit_rate_counts_fresh_reads() {
        let cache: TtlCache<u8> = TtlCache::new(4);
        assert!(cache.stats().hit_rate().abs() < f64::EPSILON);
        cache.get("a");
        cache.set("a", 1, MINUTE, None);
        cache.get("a");
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn cache_keys_are_colon_delimited() {
        let key = CacheKey::new(Upstream::Hiro, "transfers")
            .param("abc")
            .param(0)
            .param(20);
        assert_eq!(key.as_str(), "hiro:transfers:abc:0:20");

        let key = CacheKey::new(Upstream::MagicEden, "stats").param("nodemonkes");
        assert_eq!(key.to_string(), "me:stats:nodemonkes");
    }
}
