use ahash::AHashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::warn;

use crate::config::ScopeConfig;

/// A named rate-limit policy: `capacity` admissions per `window`.
///
/// Immutable, built from configuration at process start.
#[derive(Debug, Clone, PartialEq)]
pub struct RateScope {
    pub name: String,
    pub capacity: u32,
    pub window: Duration,
}

impl RateScope {
    pub fn new(name: impl Into<String>, capacity: u32, window: Duration) -> Self {
        Self { name: name.into(), capacity, window }
    }

    pub fn from_config(name: &str, cfg: &ScopeConfig) -> Self {
        Self::new(name, cfg.capacity, Duration::from_secs_f64(cfg.window_seconds))
    }
}

/// Rejection returned when a bucket is exhausted.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("rate limit exceeded; retry in ~{retry_after_secs}s")]
pub struct RateLimitExceeded {
    /// Seconds until the bucket's window resets, rounded up, at least 1
    pub retry_after_secs: u64,
}

/// Remaining admission budget for one (client key, scope name) pair.
#[derive(Debug, Clone, Copy)]
struct RateBucket {
    remaining: u32,
    reset_at: Instant,
}

/// Token-bucket rate limiter over all (client, scope) pairs.
///
/// The bucket map is the only mutable state shared across concurrent
/// requests; one mutex guards every read-modify-write against it.
#[derive(Default)]
pub struct RateLimiter {
    buckets: Mutex<AHashMap<(String, String), RateBucket>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether one request for `client_key` under `scope` is admitted.
    ///
    /// Lazy-refill token bucket: a never-seen key starts with a full bucket,
    /// and a bucket whose window has elapsed is reset to full capacity
    /// before the decision. Admission consumes one token.
    pub fn admit(&self, client_key: &str, scope: &RateScope) -> Result<(), RateLimitExceeded> {
        let now = Instant::now();
        let mut buckets = match self.buckets.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("rate limit bucket map lock poisoned; admitting request");
                return Ok(());
            }
        };

        let bucket = buckets
            .entry((client_key.to_string(), scope.name.clone()))
            .or_insert(RateBucket {
                remaining: scope.capacity,
                reset_at: now + scope.window,
            });

        if now >= bucket.reset_at {
            // Full reset, not a sliding refill
            bucket.remaining = scope.capacity;
            bucket.reset_at = now + scope.window;
        }

        if bucket.remaining == 0 {
            let until_reset = bucket.reset_at.saturating_duration_since(now);
            let retry_after_secs = (until_reset.as_secs_f64().ceil() as u64).max(1);
            return Err(RateLimitExceeded { retry_after_secs });
        }

        bucket.remaining -= 1;
        Ok(())
    }

    /// Remove buckets whose window expired more than `grace` ago.
    ///
    /// Correctness-neutral: an expired bucket refills on its next admit
    /// anyway. This only keeps the map bounded for an open set of client
    /// keys. Returns the number of buckets removed.
    pub fn sweep(&self, grace: Duration) -> usize {
        let now = Instant::now();
        let mut buckets = match self.buckets.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("rate limit bucket map lock poisoned; skipping sweep");
                return 0;
            }
        };

        let before = buckets.len();
        buckets.retain(|_, b| now.saturating_duration_since(b.reset_at) <= grace);
        before - buckets.len()
    }

    /// Number of live buckets (used by the sweeper's logging and tests).
    pub fn bucket_count(&self) -> usize {
        match self.buckets.lock() {
            Ok(guard) => guard.len(),
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(capacity: u32, window: Duration) -> RateScope {
        RateScope::new("default", capacity, window)
    }

    #[test]
    fn admissions_never_exceed_capacity_within_window() {
        let limiter = RateLimiter::new();
        let scope = scope(5, Duration::from_secs(60));

        let admitted = (0..20)
            .filter(|_| limiter.admit("10.0.0.1", &scope).is_ok())
            .count();
        assert_eq!(admitted, 5);
    }

    #[test]
    fn retry_hint_reflects_window_remainder() {
        let limiter = RateLimiter::new();
        let scope = scope(2, Duration::from_secs(60));

        assert!(limiter.admit("a", &scope).is_ok());
        assert!(limiter.admit("a", &scope).is_ok());
        let err = limiter.admit("a", &scope).expect_err("bucket exhausted");
        assert!(err.retry_after_secs >= 59 && err.retry_after_secs <= 60);
    }

    #[test]
    fn retry_hint_is_at_least_one_second() {
        let limiter = RateLimiter::new();
        let scope = scope(1, Duration::from_millis(100));

        assert!(limiter.admit("a", &scope).is_ok());
        let err = limiter.admit("a", &scope).expect_err("bucket exhausted");
        assert_eq!(err.retry_after_secs, 1);
    }

    #[test]
    fn window_elapse_fully_resets_the_bucket() {
        let limiter = RateLimiter::new();
        let scope = scope(2, Duration::from_millis(20));

        assert!(limiter.admit("a", &scope).is_ok());
        assert!(limiter.admit("a", &scope).is_ok());
        assert!(limiter.admit("a", &scope).is_err());

        std::thread::sleep(Duration::from_millis(30));

        // Full capacity again, not a partial top-up
        assert!(limiter.admit("a", &scope).is_ok());
        assert!(limiter.admit("a", &scope).is_ok());
        assert!(limiter.admit("a", &scope).is_err());
    }

    #[test]
    fn scopes_are_independent_buckets_for_the_same_client() {
        let limiter = RateLimiter::new();
        let default = RateScope::new("default", 1, Duration::from_secs(60));
        let vrf = RateScope::new("vrf", 1, Duration::from_secs(60));

        assert!(limiter.admit("a", &default).is_ok());
        assert!(limiter.admit("a", &default).is_err());
        assert!(limiter.admit("a", &vrf).is_ok());
    }

    #[test]
    fn clients_are_independent() {
        let limiter = RateLimiter::new();
        let scope = scope(1, Duration::from_secs(60));

        assert!(limiter.admit("10.0.0.1", &scope).is_ok());
        assert!(limiter.admit("10.0.0.1", &scope).is_err());
        assert!(limiter.admit("10.0.0.2", &scope).is_ok());
    }

    #[test]
    fn sweep_drops_stale_buckets_and_keeps_live_ones() {
        let limiter = RateLimiter::new();
        let short = RateScope::new("default", 1, Duration::from_millis(10));
        let long = RateScope::new("vrf", 1, Duration::from_secs(60));

        assert!(limiter.admit("stale", &short).is_ok());
        assert!(limiter.admit("live", &long).is_ok());
        assert_eq!(limiter.bucket_count(), 2);

        std::thread::sleep(Duration::from_millis(40));

        let removed = limiter.sweep(Duration::from_millis(10));
        assert_eq!(removed, 1);
        assert_eq!(limiter.bucket_count(), 1);
    }
}
