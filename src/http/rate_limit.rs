//! Client-side request pacing backed by `governor`

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = Governor<NotKeyed, InMemoryState, DefaultClock>;

/// Requests per second and burst allowance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Sustained rate
    pub requests_per_second: u32,
    /// Requests allowed back to back before pacing starts
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        // Action Network allows 4 requests per second
        Self::per_second(4)
    }
}

impl RateLimiterConfig {
    /// Rate with an explicit burst
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// Rate whose burst equals the rate
    pub fn per_second(requests_per_second: u32) -> Self {
        Self::new(requests_per_second, requests_per_second)
    }

    fn quota(&self) -> Quota {
        let clamp = |n: u32| NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN);
        Quota::per_second(clamp(self.requests_per_second)).allow_burst(clamp(self.burst_size))
    }
}

/// Shared token bucket; zero rates are treated as 1
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<DirectLimiter>,
}

impl RateLimiter {
    /// Build a limiter from its config
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            inner: Arc::new(Governor::direct(config.quota())),
        }
    }

    /// Suspend until a permit is available
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }

    /// Take a permit if one is free right now
    pub fn try_acquire(&self) -> bool {
        self.inner.check().is_ok()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RateLimiter")
    }
}
