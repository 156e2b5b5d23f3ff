//! # Runtime events emitted by the controller and its control loop.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Queue events**: records entering the queue (added or coalesced)
//! - **Attempt events**: one reconciliation attempt (starting, succeeded, failed)
//! - **Retry events**: what happened after a failure (scheduled, throttled, abandoned)
//! - **Runtime events**: feed, shutdown, and subscriber health
//!
//! These are internal observability events carried on the [`Bus`](super::Bus).
//! They are not the operator-facing warnings written to the
//! [`EventSink`](crate::EventSink).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use deployvisor::{ErrorClass, Event, EventKind};
//!
//! let ev = Event::new(EventKind::ReconcileFailed)
//!     .with_key("ns/web-1")
//!     .with_attempt(2)
//!     .with_reason("deployer pod failed")
//!     .with_class(ErrorClass::Actionable);
//!
//! assert_eq!(ev.kind, EventKind::ReconcileFailed);
//! assert_eq!(ev.key.as_deref(), Some("ns/web-1"));
//! assert_eq!(ev.class, Some(ErrorClass::Actionable));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::error::ErrorClass;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `key`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `key`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Runtime events ===
    /// Watch feed ended; no further records will arrive from it.
    ///
    /// Sets:
    /// - `reason`: why the feed ended
    FeedClosed,

    /// Shutdown requested (OS signal or explicit cancel).
    ShutdownRequested,

    /// Control loop stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; the control loop was still busy.
    GraceExceeded,

    // === Queue events ===
    /// A record for a key that was not pending entered the queue.
    ///
    /// Sets:
    /// - `key`: object key
    RecordEnqueued,

    /// A pending record was replaced by a newer one for the same key.
    ///
    /// Sets:
    /// - `key`: object key
    RecordCoalesced,

    // === Attempt events ===
    /// Reconciliation attempt is starting.
    ///
    /// Sets:
    /// - `key`: object key
    /// - `attempt`: attempt number (1-based, per key, reset on success/abandon)
    ReconcileStarting,

    /// Reconciliation attempt succeeded; retry state for the key is forgotten.
    ///
    /// Sets:
    /// - `key`: object key
    /// - `attempt`: attempt number
    ReconcileSucceeded,

    /// Reconciliation attempt failed.
    ///
    /// Sets:
    /// - `key`: object key
    /// - `attempt`: attempt number
    /// - `reason`: error message
    /// - `class`: error class
    ReconcileFailed,

    // === Retry events ===
    /// Rate limiter had no token; the requeue waits for the next refill.
    ///
    /// Sets:
    /// - `key`: object key
    /// - `delay_ms`: time until the next token (ms)
    RetryThrottled,

    /// Key was put back into the queue for another attempt.
    ///
    /// Sets:
    /// - `key`: object key
    /// - `attempt`: number of the upcoming attempt
    RetryScheduled,

    /// Retry policy gave up on the key.
    ///
    /// Sets:
    /// - `key`: object key
    /// - `attempt`: last attempt number
    /// - `reason`: last error message
    /// - `class`: class of the last error
    RetryAbandoned,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Object key (`namespace/name`) or subscriber name.
    pub key: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Class of the error behind a failure event.
    pub class: Option<ErrorClass>,
    /// Wait before a throttled requeue, in milliseconds (compact).
    pub delay_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            key: None,
            attempt: None,
            reason: None,
            class: None,
            delay_ms: None,
        }
    }

    /// Attaches an object key (or subscriber name).
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an error class.
    #[inline]
    pub fn with_class(mut self, class: ErrorClass) -> Self {
        self.class = Some(class);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_key(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_key(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::RecordEnqueued);
        let b = Event::new(EventKind::RecordEnqueued);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn delay_saturates_at_u32() {
        let ev = Event::new(EventKind::RetryThrottled).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }
}
