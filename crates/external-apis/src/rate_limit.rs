// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Per-upstream request rate governance
//!
//! Each upstream gets one [`TokenBucket`] sized to a safety fraction of its
//! published requests-per-minute budget. Buckets live in a
//! [`LimiterRegistry`] owned by whoever builds the clients; asking for the
//! same name twice returns the same bucket.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

/// Default fraction of the published budget actually used
pub const DEFAULT_RATE_LIMIT_BUFFER: f64 = 0.8;

/// Longest single sleep while waiting for a token
const MAX_WAIT_SLICE: Duration = Duration::from_secs(1);
/// Shortest sleep, guards against float rounding leaving a sliver of a token
const MIN_WAIT_SLICE: Duration = Duration::from_millis(1);

const MS_PER_MINUTE: f64 = 60_000.0;

/// Errors raised while building or registering rate limiters
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(missing_docs)]
pub enum RateLimitError {
    /// Buffer fraction outside `(0, 1]`
    #[error("rate limit buffer must be within (0, 1], got {buffer}")]
    InvalidBuffer { buffer: f64 },

    /// The buffered budget rounds down to zero requests per minute
    #[error(
        "effective rate limit is zero ({max_requests_per_minute} rpm with buffer {buffer}); \
         no request could ever be sent"
    )]
    ZeroCapacity {
        max_requests_per_minute: u32,
        buffer: f64,
    },

    /// A limiter with this name already exists with different parameters
    #[error(
        "rate limiter '{name}' already registered with {existing_rpm} rpm and buffer \
         {existing_buffer}, cannot re-register with {requested_rpm} rpm and buffer {requested_buffer}"
    )]
    ConflictingLimits {
        name: String,
        existing_rpm: u32,
        existing_buffer: f64,
        requested_rpm: u32,
        requested_buffer: f64,
    },
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket refilled continuously at the effective per-minute rate
#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<BucketState>,
    /// Serves waiters in arrival order
    turnstile: tokio::sync::Mutex<()>,
    max_tokens: f64,
    refill_rate_per_ms: f64,
    max_requests_per_minute: u32,
    buffer: f64,
}

impl TokenBucket {
    /// Create a full bucket allowing `floor(max_requests_per_minute * buffer)`
    /// requests per minute
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::InvalidBuffer`] if `buffer` is not within
    /// `(0, 1]`, and [`RateLimitError::ZeroCapacity`] if the effective rate
    /// rounds down to zero.
    pub fn new(max_requests_per_minute: u32, buffer: f64) -> Result<Self, RateLimitError> {
        if buffer.is_nan() || buffer <= 0.0 || buffer > 1.0 {
            return Err(RateLimitError::InvalidBuffer { buffer });
        }

        let effective = (f64::from(max_requests_per_minute) * buffer).floor();
        if effective < 1.0 {
            return Err(RateLimitError::ZeroCapacity {
                max_requests_per_minute,
                buffer,
            });
        }

        Ok(Self {
            state: Mutex::new(BucketState {
                tokens: effective,
                last_refill: Instant::now(),
            }),
            turnstile: tokio::sync::Mutex::new(()),
            max_tokens: effective,
            refill_rate_per_ms: effective / MS_PER_MINUTE,
            max_requests_per_minute,
            buffer,
        })
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(state.last_refill).as_secs_f64() * 1000.0;
        state.tokens = (state.tokens + elapsed_ms * self.refill_rate_per_ms).min(self.max_tokens);
        state.last_refill = now;
    }

    /// Whether a token is available right now, without consuming it
    pub fn can_consume(&self) -> bool {
        let mut state = self.lock();
        self.refill(&mut state);
        state.tokens >= 1.0
    }

    /// Take one token if available
    ///
    /// Returns `false` and leaves the bucket untouched when fewer than one
    /// token remains.
    pub fn consume(&self) -> bool {
        let mut state = self.lock();
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Current token count after refilling
    pub fn available(&self) -> f64 {
        let mut state = self.lock();
        self.refill(&mut state);
        state.tokens
    }

    /// Wait until a token is available, then consume it
    ///
    /// Waiters are served first come, first served. Each sleep lasts until the
    /// next token is due, capped at one second.
    pub async fn wait(&self) {
        let _turn = self.turnstile.lock().await;
        loop {
            let delay = {
                let mut state = self.lock();
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                let missing_ms = (1.0 - state.tokens) / self.refill_rate_per_ms;
                Duration::from_secs_f64(missing_ms / 1000.0)
            };
            let delay = delay.clamp(MIN_WAIT_SLICE, MAX_WAIT_SLICE);
            debug!(
                delay_ms = delay.as_millis(),
                max_requests_per_minute = self.max_requests_per_minute,
                "rate limit reached, waiting for next token"
            );
            sleep(delay).await;
        }
    }

    /// Capacity of the bucket, i.e. the effective requests per minute
    pub const fn max_tokens(&self) -> f64 {
        self.max_tokens
    }

    /// Tokens added per millisecond
    pub const fn refill_rate_per_ms(&self) -> f64 {
        self.refill_rate_per_ms
    }

    /// Published budget this bucket was built from
    pub const fn max_requests_per_minute(&self) -> u32 {
        self.max_requests_per_minute
    }

    /// Safety fraction this bucket was built with
    pub const fn buffer(&self) -> f64 {
        self.buffer
    }

    fn has_parameters(&self, max_requests_per_minute: u32, buffer: f64) -> bool {
        self.max_requests_per_minute == max_requests_per_minute
            && (self.buffer - buffer).abs() < f64::EPSILON
    }
}

/// Named collection of token buckets, one per upstream
#[derive(Debug, Default)]
pub struct LimiterRegistry {
    buckets: DashMap<String, Arc<TokenBucket>>,
}

impl LimiterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bucket registered under `name`, creating it on first use
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::ConflictingLimits`] if `name` is already
    /// registered with different parameters, or any construction error from
    /// [`TokenBucket::new`].
    pub fn get(
        &self,
        name: &str,
        max_requests_per_minute: u32,
        buffer: f64,
    ) -> Result<Arc<TokenBucket>, RateLimitError> {
        match self.buckets.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                let bucket = entry.get();
                if bucket.has_parameters(max_requests_per_minute, buffer) {
                    Ok(Arc::clone(bucket))
                } else {
                    Err(RateLimitError::ConflictingLimits {
                        name: name.to_string(),
                        existing_rpm: bucket.max_requests_per_minute,
                        existing_buffer: bucket.buffer,
                        requested_rpm: max_requests_per_minute,
                        requested_buffer: buffer,
                    })
                }
            }
            Entry::Vacant(entry) => {
                let bucket = Arc::new(TokenBucket::new(max_requests_per_minute, buffer)?);
                info!(
                    limiter = name,
                    max_requests_per_minute,
                    buffer,
                    effective_rpm = bucket.max_tokens,
                    "registered rate limiter"
                );
                entry.insert(Arc::clone(&bucket));
                Ok(bucket)
            }
        }
    }

    /// Look up an existing bucket without creating one
    pub fn existing(&self, name: &str) -> Option<Arc<TokenBucket>> {
        self.buckets.get(name).map(|bucket| Arc::clone(bucket.value()))
    }

    /// Number of registered buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no bucket has been registered
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::advance;

    use super::*;

    #[test]
    fn effective_rate_applies_buffer() {
        let bucket = TokenBucket::new(60, 0.8).unwrap();
        assert!((bucket.max_tokens() - 48.0).abs() < f64::EPSILON);
        assert!((bucket.refill_rate_per_ms() - 48.0 / 60_000.0).abs() < f64::EPSILON);

        let bucket = TokenBucket::new(50, 0.8).unwrap();
        assert!((bucket.max_tokens() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(matches!(
            TokenBucket::new(60, 0.0),
            Err(RateLimitError::InvalidBuffer { .. })
        ));
        assert!(matches!(
            TokenBucket::new(60, 1.5),
            Err(RateLimitError::InvalidBuffer { .. })
        ));
        assert!(matches!(
            TokenBucket::new(60, f64::NAN),
            Err(RateLimitError::InvalidBuffer { .. })
        ));
        assert!(matches!(
            TokenBucket::new(1, 0.8),
            Err(RateLimitError::ZeroCapacity { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn bucket_drains_then_refuses() {
        let bucket = TokenBucket::new(60, 0.8).unwrap();
        for _ in 0..48 {
            assert!(bucket.consume());
        }
        assert!(!bucket.can_consume());
        assert!(!bucket.consume());
        assert!(bucket.available() < 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn refill_is_proportional_and_capped() {
        let bucket = TokenBucket::new(60, 1.0).unwrap();
        for _ in 0..60 {
            assert!(bucket.consume());
        }

        // 60 rpm is one token per second
        advance(Duration::from_millis(2500)).await;
        assert!((bucket.available() - 2.5).abs() < 1e-6);

        advance(Duration::from_secs(600)).await;
        assert!((bucket.available() - 60.0).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_consume_leaves_tokens_unchanged() {
        let bucket = TokenBucket::new(60, 1.0).unwrap();
        for _ in 0..60 {
            bucket.consume();
        }
        advance(Duration::from_millis(500)).await;
        assert!(!bucket.consume());
        assert!((bucket.available() - 0.5).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_resolves_once_a_token_refills() {
        let bucket = TokenBucket::new(60, 1.0).unwrap();
        for _ in 0..60 {
            bucket.consume();
        }

        let start = Instant::now();
        bucket.wait().await;
        let waited = start.elapsed();

        assert!(waited >= Duration::from_secs(1));
        assert!(waited < Duration::from_millis(1100));
        assert!(bucket.available() < 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_returns_immediately_with_tokens() {
        let bucket = TokenBucket::new(60, 1.0).unwrap();
        let start = Instant::now();
        bucket.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!((bucket.available() - 59.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_are_served_in_order() {
        let bucket = Arc::new(TokenBucket::new(60, 1.0).unwrap());
        for _ in 0..60 {
            bucket.consume();
        }

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for id in 0..3 {
            let bucket = Arc::clone(&bucket);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                bucket.wait().await;
                order.lock().unwrap().push(id);
            }));
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn registry_returns_shared_bucket() {
        let registry = LimiterRegistry::new();
        let first = registry.get("hiro", 50, 0.8).unwrap();
        let second = registry.get("hiro", 50, 0.8).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert!(registry.existing("hiro").is_some());
        assert!(registry.existing("ordiscan").is_none());
    }

    #[test]
    fn registry_rejects_conflicting_parameters() {
        let registry = LimiterRegistry::new();
        registry.get("hiro", 50, 0.8).unwrap();

        let err = registry.get("hiro", 500, 0.8).unwrap_err();
        assert!(matches!(err, RateLimitError::ConflictingLimits { .. }));
        let err = registry.get("hiro", 50, 0.5).unwrap_err();
        assert!(matches!(err, RateLimitError::ConflictingLimits { .. }));
    }
}
