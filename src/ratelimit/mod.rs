//! Per-client admission control.

mod bucket;
mod limiter;

pub use bucket::TokenBucket;
pub use limiter::{spawn_idle_eviction, RateLimiter};
