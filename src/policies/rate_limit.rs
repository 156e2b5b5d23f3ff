//! # Token-bucket rate limiter.
//!
//! [`RateLimiter`] bounds the **aggregate** rate of retry requeues across all
//! keys. One instance is built by the controller and shared by reference.
//!
//! ```text
//! capacity = burst (bucket starts full)
//! +1 token every `refill_every`, never above `burst`
//!
//! try_acquire(): token available? ──yes──► consume, true
//!                                  └─no──► false ("not yet", not an error)
//! acquire():     try_acquire() in a loop, sleeping until the next refill
//! ```
//!
//! Time is read from `tokio::time`, so a paused test clock freezes refills.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{self, Instant};

use crate::core::RateLimitConfig;

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    /// Instant the last whole token was credited.
    last: Instant,
}

/// Process-wide token bucket.
#[derive(Debug)]
pub struct RateLimiter {
    burst: u32,
    refill_every: Duration,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Creates a full bucket of `burst` tokens refilled one per `refill_every`.
    ///
    /// `burst` is clamped to at least 1 and `refill_every` to at least 1ns.
    pub fn new(burst: u32, refill_every: Duration) -> Self {
        let burst = burst.max(1);
        Self {
            burst,
            refill_every: refill_every.max(Duration::from_nanos(1)),
            bucket: Mutex::new(Bucket {
                tokens: burst,
                last: Instant::now(),
            }),
        }
    }

    pub fn from_config(cfg: &RateLimitConfig) -> Self {
        Self::new(cfg.burst, cfg.refill_every)
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }

    /// Consumes a token if one is available.
    pub fn try_acquire(&self) -> bool {
        let mut bucket = self.lock();
        self.refill(&mut bucket, Instant::now());
        if bucket.tokens == 0 {
            return false;
        }
        bucket.tokens -= 1;
        true
    }

    /// Waits until a token is available and consumes it.
    ///
    /// Cancel-safe: dropping the future never consumes a token.
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            time::sleep(self.time_until_next()).await;
        }
    }

    /// Tokens currently in the bucket.
    pub fn available(&self) -> u32 {
        let mut bucket = self.lock();
        self.refill(&mut bucket, Instant::now());
        bucket.tokens
    }

    /// Time until the next token is credited (zero if one is available).
    pub fn time_until_next(&self) -> Duration {
        let now = Instant::now();
        let mut bucket = self.lock();
        self.refill(&mut bucket, now);
        if bucket.tokens > 0 {
            return Duration::ZERO;
        }
        self.refill_every
            .saturating_sub(now.saturating_duration_since(bucket.last))
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        let elapsed = now.saturating_duration_since(bucket.last);
        let whole = elapsed.as_nanos() / self.refill_every.as_nanos();
        if whole == 0 {
            return;
        }
        let credited = u32::try_from(whole).unwrap_or(u32::MAX);
        bucket.tokens = bucket.tokens.saturating_add(credited).min(self.burst);
        if bucket.tokens == self.burst {
            // A full bucket does not bank time.
            bucket.last = now;
        } else {
            bucket.last += self.refill_every * credited;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Bucket> {
        self.bucket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_then_exhausted() {
        let limiter = RateLimiter::new(10, Duration::from_secs(1));
        for i in 0..10 {
            assert!(limiter.try_acquire(), "token {i} should be available");
        }
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.available(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn refills_one_token_per_interval() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        time::advance(Duration::from_millis(999)).await;
        assert!(!limiter.try_acquire());

        time::advance(Duration::from_millis(1)).await;
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn refill_never_exceeds_burst() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));
        assert!(limiter.try_acquire());
        time::advance(Duration::from_secs(60)).await;
        assert_eq!(limiter.available(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn full_bucket_does_not_bank_time() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1));
        time::advance(Duration::from_secs(10)).await;
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.time_until_next(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_waits_for_refill() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1));
        assert!(limiter.try_acquire());

        let started = Instant::now();
        limiter.acquire().await;
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(limiter.available(), 0);
    }

    #[tokio::test]
    async fn zero_burst_is_clamped() {
        let limiter = RateLimiter::new(0, Duration::from_secs(1));
        assert_eq!(limiter.burst(), 1);
    }
}
