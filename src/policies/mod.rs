//! Retry policies.
//!
//! This module groups the knobs that decide **whether** a failed key is
//! attempted again and **how fast** retries may flow back into the queue.
//!
//! ## Contents
//! - [`classify`]     error → Fatal / Actionable / Transient
//! - [`RetryPolicy`]  retry vs. abandon, warning event on exhausted actionable errors
//! - [`RetryState`]   per-key failure count and last error
//! - [`RateLimiter`]  shared token bucket gating every requeue
//!
//! ## Quick wiring
//! ```text
//! ControlLoop ── failure ──► RetryManager
//!                              ├─► RetryPolicy::should_retry(record, err, state)
//!                              └─► RateLimiter::acquire() → queue.enqueue_if_absent()
//! ```
//!
//! ## Defaults
//! - Abandon once `count > 1` (at most three attempts per key).
//! - Burst 10, one token per second.

mod classify;
mod rate_limit;
mod retry;

pub use classify::classify;
pub use rate_limit::RateLimiter;
pub use retry::{MAX_RECORDED_FAILURES, RetryPolicy, RetryState};
