//! Per-client token-bucket rate limiter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use super::bucket::TokenBucket;
use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitSettings;
use crate::error::Result;

/// Admission control keyed by client identifier.
///
/// Every client gets its own bucket, created full on first sight. A single
/// mutex covers the lookup and the refill/deduct arithmetic, so requests
/// from different clients serialize briefly on the map.
pub struct RateLimiter {
    /// Buckets indexed by client key
    buckets: Mutex<HashMap<String, TokenBucket>>,
    /// Tokens added per second
    refill_rate: f64,
    /// Bucket capacity
    burst: f64,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a rate limiter on the system clock.
    pub fn new(settings: &RateLimitSettings) -> Result<Self> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Create a rate limiter reading time from `clock`.
    pub fn with_clock(settings: &RateLimitSettings, clock: Arc<dyn Clock>) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            buckets: Mutex::new(HashMap::new()),
            refill_rate: settings.refill_rate,
            burst: f64::from(settings.burst),
            clock,
        })
    }

    /// Admit or reject one request from `key`.
    ///
    /// Never blocks beyond the map lock. A rejected request consumes nothing.
    pub fn allow(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut buckets = self.buckets.lock();

        let bucket = buckets.entry(key.to_string()).or_insert_with(|| {
            debug!(key = %key, burst = self.burst, "Creating token bucket");
            TokenBucket::full(self.burst, now)
        });
        bucket.refill(now, self.refill_rate, self.burst);

        let allowed = bucket.try_take();
        trace!(
            key = %key,
            allowed = allowed,
            tokens = bucket.tokens(),
            "Checked rate limit"
        );
        if !allowed {
            debug!(key = %key, "Rate limit exceeded");
        }
        allowed
    }

    /// Tokens currently held for `key`, as of its last refill.
    ///
    /// Returns `None` if the client has never been seen.
    pub fn tokens(&self, key: &str) -> Option<f64> {
        self.buckets.lock().get(key).map(TokenBucket::tokens)
    }

    /// Drop buckets whose client has not been seen for longer than `max_idle`.
    ///
    /// Returns the number of buckets removed. A returning client starts over
    /// with a full bucket.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = self.clock.now();
        let mut buckets = self.buckets.lock();
        let before = buckets.len();

        buckets.retain(|_, bucket| match (now - bucket.last_refill()).to_std() {
            Ok(idle) => idle <= max_idle,
            Err(_) => true,
        });

        let evicted = before - buckets.len();
        if evicted > 0 {
            debug!(evicted = evicted, remaining = buckets.len(), "Evicted idle buckets");
        }
        evicted
    }

    /// Clear all buckets.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.buckets.lock().clear();
    }

    /// Get the number of tracked clients.
    pub fn bucket_count(&self) -> usize {
        self.buckets.lock().len()
    }
}

/// Periodically evict idle buckets until the returned task is aborted.
pub fn spawn_idle_eviction(
    limiter: Arc<RateLimiter>,
    every: Duration,
    max_idle: Duration,
) -> JoinHandle<()> {
    info!(
        every_secs = every.as_secs_f64(),
        max_idle_secs = max_idle.as_secs(),
        "Starting idle bucket eviction"
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            limiter.evict_idle(max_idle);
        }
    })
}
