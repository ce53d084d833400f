//! Token bucket state for a single client.

use chrono::{DateTime, Utc};

/// Slack for refill deltas that land a hair under a whole token.
///
/// Elapsed time is measured in nanoseconds, so waiting exactly
/// `1 / refill_rate` seconds yields 0.999999999 tokens for rates like 3/s.
const TOKEN_EPSILON: f64 = 1e-6;

/// Continuously refilled token bucket.
///
/// Tokens are fractional so refill tracks the wall-clock delta exactly
/// instead of ticking once per second. `tokens` stays within `[0, burst]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBucket {
    tokens: f64,
    last_refill: DateTime<Utc>,
}

impl TokenBucket {
    /// A bucket holding its full `burst` allowance.
    pub fn full(burst: f64, now: DateTime<Utc>) -> Self {
        Self {
            tokens: burst,
            last_refill: now,
        }
    }

    /// Add `elapsed * rate` tokens, capped at `burst`.
    ///
    /// A clock that moved backwards adds nothing and leaves `last_refill`
    /// where it was.
    pub fn refill(&mut self, now: DateTime<Utc>, rate: f64, burst: f64) {
        let elapsed = match (now - self.last_refill).to_std() {
            Ok(elapsed) => elapsed,
            Err(_) => return,
        };
        self.tokens = (self.tokens + elapsed.as_secs_f64() * rate).min(burst);
        self.last_refill = now;
    }

    /// Take one token if a whole one is available, within `TOKEN_EPSILON`.
    pub fn try_take(&mut self) -> bool {
        if self.tokens + TOKEN_EPSILON >= 1.0 {
            self.tokens = (self.tokens - 1.0).max(0.0);
            true
        } else {
            false
        }
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn last_refill(&self) -> DateTime<Utc> {
        self.last_refill
    }
}
