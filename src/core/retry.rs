//! # Retry bookkeeping for the control loop.
//!
//! [`RetryManager`] owns the per-key [`RetryState`] map and turns a
//! [`RetryPolicy`] decision into queue operations:
//!
//! ```text
//! failure(record, err)
//!   ├─ policy.should_retry(prior state)?
//!   │     └─ no  ──► forget key ──► publish RetryAbandoned
//!   └─ yes ──► limiter.try_acquire()? ──► no: publish RetryThrottled, await token
//!              │                                 └─ cancelled ──► forget key
//!              └─ queue.enqueue_if_absent(key, record)
//!                    ├─ closed ──► forget key
//!                    └─ else   ──► store prior.next(err) ──► publish RetryScheduled
//! ```
//!
//! ## Rules
//! - State exists only for keys that failed and were not yet resolved.
//! - Success, abandonment or a requeue that never happened removes the key's state.
//! - A requeue never overwrites a newer pending record for the same key.
//! - Waiting for a token stops when the loop token is cancelled.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::deployment::{DeploymentRecord, ObjectKey};
use crate::error::{ErrorClass, ReconcileError};
use crate::events::{Bus, Event, EventKind};
use crate::policies::{RateLimiter, RetryPolicy, RetryState};
use crate::queue::{Enqueued, ReconcileQueue};

/// What the retry layer did with a failed record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Record was requeued; `attempt` is the number of the upcoming attempt.
    Requeued { attempt: u32 },
    /// Policy gave up on the key.
    Abandoned { class: ErrorClass },
    /// Not requeued: cancelled while waiting for a rate-limiter token, or
    /// the queue was already closed.
    Cancelled,
}

/// Per-key retry state plus the rate-limited requeue path.
pub struct RetryManager {
    policy: RetryPolicy,
    limiter: Arc<RateLimiter>,
    queue: Arc<ReconcileQueue>,
    bus: Bus,
    retries: HashMap<ObjectKey, RetryState>,
}

impl RetryManager {
    pub fn new(
        policy: RetryPolicy,
        limiter: Arc<RateLimiter>,
        queue: Arc<ReconcileQueue>,
        bus: Bus,
    ) -> Self {
        Self {
            policy,
            limiter,
            queue,
            bus,
            retries: HashMap::new(),
        }
    }

    /// Number of the attempt about to run for `key` (1-based).
    pub fn attempt(&self, key: &ObjectKey) -> u32 {
        self.retries.get(key).map_or(1, |s| s.count + 1)
    }

    /// Retry state recorded for `key`, if it has unresolved failures.
    pub fn state(&self, key: &ObjectKey) -> Option<&RetryState> {
        self.retries.get(key)
    }

    /// Number of keys with unresolved failures.
    pub fn tracked(&self) -> usize {
        self.retries.len()
    }

    /// Drops the retry state of `key` after a successful attempt.
    pub fn forget(&mut self, key: &ObjectKey) {
        self.retries.remove(key);
    }

    /// Handles one failed attempt of `record`.
    pub async fn on_failure(
        &mut self,
        record: &DeploymentRecord,
        err: &ReconcileError,
        token: &CancellationToken,
    ) -> RetryDecision {
        let key = record.key();
        let prior = self.retries.get(key).cloned().unwrap_or_default();

        if !self.policy.should_retry(record, err, &prior) {
            self.retries.remove(key);
            let class = err.class();
            self.bus.publish(
                Event::new(EventKind::RetryAbandoned)
                    .with_key(key.to_string())
                    .with_attempt(prior.count + 1)
                    .with_reason(err.to_string())
                    .with_class(class),
            );
            return RetryDecision::Abandoned { class };
        }

        let next = prior.next(err);
        let attempt = next.count + 1;

        if !self.limiter.try_acquire() {
            self.bus.publish(
                Event::new(EventKind::RetryThrottled)
                    .with_key(key.to_string())
                    .with_delay(self.limiter.time_until_next()),
            );
            select! {
                _ = self.limiter.acquire() => {}
                _ = token.cancelled() => {
                    self.retries.remove(key);
                    return RetryDecision::Cancelled;
                }
            }
        }

        if self.queue.enqueue_if_absent(key.clone(), record.clone()) == Enqueued::Closed {
            self.retries.remove(key);
            return RetryDecision::Cancelled;
        }
        self.retries.insert(key.clone(), next);
        self.bus.publish(
            Event::new(EventKind::RetryScheduled)
                .with_key(key.to_string())
                .with_attempt(attempt),
        );
        RetryDecision::Requeued { attempt }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::deployment::StrategyDescriptor;
    use crate::recorder::MemorySink;

    struct Fixture {
        manager: RetryManager,
        queue: Arc<ReconcileQueue>,
        sink: Arc<MemorySink>,
        bus: Bus,
    }

    fn fixture(burst: u32) -> Fixture {
        let sink = Arc::new(MemorySink::new());
        let queue = Arc::new(ReconcileQueue::new());
        let bus = Bus::new(64);
        let manager = RetryManager::new(
            RetryPolicy::new(sink.clone()),
            Arc::new(RateLimiter::new(burst, Duration::from_secs(1))),
            queue.clone(),
            bus.clone(),
        );
        Fixture {
            manager,
            queue,
            sink,
            bus,
        }
    }

    fn record(status: &str) -> DeploymentRecord {
        DeploymentRecord::new(ObjectKey::new("ns", "web-1"), StrategyDescriptor::Rolling)
            .with_status(status)
    }

    #[tokio::test]
    async fn transient_failures_requeue_then_abandon_on_third() {
        let mut f = fixture(10);
        let token = CancellationToken::new();
        let rec = record("v1");
        let err = ReconcileError::transient("store timeout");

        assert_eq!(
            f.manager.on_failure(&rec, &err, &token).await,
            RetryDecision::Requeued { attempt: 2 }
        );
        f.queue.try_pop();
        assert_eq!(
            f.manager.on_failure(&rec, &err, &token).await,
            RetryDecision::Requeued { attempt: 3 }
        );
        f.queue.try_pop();
        assert_eq!(
            f.manager.on_failure(&rec, &err, &token).await,
            RetryDecision::Abandoned {
                class: ErrorClass::Transient
            }
        );

        assert!(f.queue.is_empty());
        assert!(f.manager.state(rec.key()).is_none());
        assert!(f.sink.is_empty());
    }

    #[tokio::test]
    async fn fatal_is_abandoned_immediately() {
        let mut f = fixture(10);
        let token = CancellationToken::new();
        let rec = record("v1");

        let decision = f
            .manager
            .on_failure(&rec, &ReconcileError::fatal("bad spec"), &token)
            .await;

        assert_eq!(
            decision,
            RetryDecision::Abandoned {
                class: ErrorClass::Fatal
            }
        );
        assert!(f.queue.is_empty());
        assert_eq!(f.manager.tracked(), 0);
    }

    #[tokio::test]
    async fn requeue_keeps_newer_pending_record() {
        let mut f = fixture(10);
        let token = CancellationToken::new();
        f.queue.enqueue(ObjectKey::new("ns", "web-1"), record("newer"));

        f.manager
            .on_failure(&record("old"), &ReconcileError::transient("x"), &token)
            .await;

        let (_, pending) = f.queue.try_pop().unwrap();
        assert_eq!(pending.status, "newer");
        assert_eq!(f.manager.attempt(pending.key()), 2);
    }

    #[tokio::test]
    async fn forget_resets_attempts() {
        let mut f = fixture(10);
        let token = CancellationToken::new();
        let rec = record("v1");

        f.manager
            .on_failure(&rec, &ReconcileError::actionable("pod failed"), &token)
            .await;
        assert_eq!(f.manager.attempt(rec.key()), 2);

        f.manager.forget(rec.key());
        assert_eq!(f.manager.attempt(rec.key()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_bucket_throttles_requeue() {
        let mut f = fixture(1);
        let mut rx = f.bus.subscribe();
        let token = CancellationToken::new();
        let a = record("v1");
        let b = DeploymentRecord::new(ObjectKey::new("ns", "web-2"), StrategyDescriptor::Recreate);

        f.manager
            .on_failure(&a, &ReconcileError::transient("x"), &token)
            .await;
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::RetryScheduled);

        let started = tokio::time::Instant::now();
        f.manager
            .on_failure(&b, &ReconcileError::transient("x"), &token)
            .await;
        assert!(started.elapsed() >= Duration::from_secs(1));

        let throttled = rx.recv().await.unwrap();
        assert_eq!(throttled.kind, EventKind::RetryThrottled);
        assert!(throttled.delay_ms.unwrap() > 0);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::RetryScheduled);
        assert_eq!(f.queue.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_while_throttled() {
        let mut f = fixture(1);
        let token = CancellationToken::new();
        f.manager
            .on_failure(&record("v1"), &ReconcileError::transient("x"), &token)
            .await;

        token.cancel();
        let other = DeploymentRecord::new(ObjectKey::new("ns", "web-2"), StrategyDescriptor::Recreate);
        let decision = f
            .manager
            .on_failure(&other, &ReconcileError::transient("x"), &token)
            .await;

        assert_eq!(decision, RetryDecision::Cancelled);
        assert!(!f.queue.contains(other.key()));
        assert!(f.manager.state(other.key()).is_none());
        assert_eq!(f.manager.tracked(), 1);
    }

    #[tokio::test]
    async fn closed_queue_drops_retry_state() {
        let mut f = fixture(10);
        let mut rx = f.bus.subscribe();
        let token = CancellationToken::new();
        let rec = record("v1");

        f.manager
            .on_failure(&rec, &ReconcileError::transient("x"), &token)
            .await;
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::RetryScheduled);
        f.queue.try_pop();
        f.queue.close();

        let decision = f
            .manager
            .on_failure(&rec, &ReconcileError::transient("x"), &token)
            .await;

        assert_eq!(decision, RetryDecision::Cancelled);
        assert!(f.queue.is_empty());
        assert_eq!(f.manager.tracked(), 0);
        assert!(rx.try_recv().is_err());
    }
}
