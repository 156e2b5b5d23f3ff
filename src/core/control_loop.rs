//! # ControlLoop: the single consumer of the reconcile queue.
//!
//! Pops one key at a time, runs the reconciler once, and hands failures to
//! the [`RetryManager`]. The loop never looks at what an error *is*; that is
//! the retry policy's job.
//!
//! ```text
//! loop {
//!   ├─► queue.pop()            (or token cancelled → exit)
//!   ├─► publish ReconcileStarting
//!   ├─► reconciler.reconcile(record)
//!   │     ├─ Ok  → forget retry state, publish ReconcileSucceeded
//!   │     └─ Err → publish ReconcileFailed, RetryManager::on_failure
//!   └─► next item
//! }
//! ```
//!
//! ## Rules
//! - One reconciliation at a time; a key is never processed concurrently.
//! - An in-flight reconciliation is not interrupted by cancellation; the loop
//!   checks the token between items and while waiting for a retry token.
//! - The loop ends when the token is cancelled or the queue is closed and drained.

use std::sync::Arc;

use tokio::select;
use tokio_util::sync::CancellationToken;

use super::retry::{RetryDecision, RetryManager};
use crate::deployment::{DeploymentRecord, ObjectKey};
use crate::error::ErrorClass;
use crate::events::{Bus, Event, EventKind};
use crate::policies::{RateLimiter, RetryPolicy, RetryState};
use crate::queue::ReconcileQueue;
use crate::reconcile::ReconcileRef;

/// Result of processing one queue item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    /// Failed and requeued; `attempt` is the upcoming attempt number.
    Requeued { attempt: u32 },
    /// Failed and given up on.
    Abandoned { class: ErrorClass },
    /// Failed, then cancelled while waiting to requeue.
    Cancelled,
}

/// Drives reconciliation for every key that enters the queue.
pub struct ControlLoop {
    queue: Arc<ReconcileQueue>,
    reconciler: ReconcileRef,
    retries: RetryManager,
    bus: Bus,
}

impl ControlLoop {
    pub fn new(
        queue: Arc<ReconcileQueue>,
        reconciler: ReconcileRef,
        policy: RetryPolicy,
        limiter: Arc<RateLimiter>,
        bus: Bus,
    ) -> Self {
        let retries = RetryManager::new(policy, limiter, queue.clone(), bus.clone());
        Self {
            queue,
            reconciler,
            retries,
            bus,
        }
    }

    /// Processes items until `token` is cancelled or the queue is closed and empty.
    pub async fn run(mut self, token: CancellationToken) {
        loop {
            let item = select! {
                biased;
                _ = token.cancelled() => break,
                item = self.queue.pop() => item,
            };
            let Some((key, record)) = item else {
                break;
            };
            if self.process(key, record, &token).await == Outcome::Cancelled {
                break;
            }
        }
    }

    /// Runs one reconciliation attempt for `record` and applies the retry decision.
    pub async fn process(
        &mut self,
        key: ObjectKey,
        record: DeploymentRecord,
        token: &CancellationToken,
    ) -> Outcome {
        let attempt = self.retries.attempt(&key);
        let label = key.to_string();
        self.bus.publish(
            Event::new(EventKind::ReconcileStarting)
                .with_key(label.as_str())
                .with_attempt(attempt),
        );

        match self.reconciler.reconcile(&record).await {
            Ok(()) => {
                self.retries.forget(&key);
                self.bus.publish(
                    Event::new(EventKind::ReconcileSucceeded)
                        .with_key(label)
                        .with_attempt(attempt),
                );
                Outcome::Succeeded
            }
            Err(err) => {
                self.bus.publish(
                    Event::new(EventKind::ReconcileFailed)
                        .with_key(label)
                        .with_attempt(attempt)
                        .with_reason(err.to_string())
                        .with_class(err.class()),
                );
                match self.retries.on_failure(&record, &err, token).await {
                    RetryDecision::Requeued { attempt } => Outcome::Requeued { attempt },
                    RetryDecision::Abandoned { class } => Outcome::Abandoned { class },
                    RetryDecision::Cancelled => Outcome::Cancelled,
                }
            }
        }
    }

    /// Retry state of `key`, if it has unresolved failures.
    pub fn retry_state(&self, key: &ObjectKey) -> Option<&RetryState> {
        self.retries.state(key)
    }

    pub fn reconciler_name(&self) -> &str {
        self.reconciler.name()
    }
}
