//! # Retry policy for failed reconciliations.
//!
//! [`RetryPolicy::should_retry`] decides, for one failure of one key, whether
//! the key gets another attempt.
//!
//! ```text
//! classify(err)
//!   ├─ Fatal ─────────────────────────► log error, abandon (no event)
//!   └─ Actionable / Transient
//!        ├─ retry.count > 1 ──► Actionable? emit FailedRetry warning
//!        │                      abandon
//!        └─ otherwise ─────────► retry
//! ```
//!
//! ## Rules
//! - `retry.count` is the number of failures recorded **before** this one, so
//!   a key is attempted at most three times for retryable errors.
//! - The ceiling is fixed; there is no backoff growth. Pacing across keys is
//!   the shared [`RateLimiter`](crate::RateLimiter)'s job, not this policy's.
//! - Only exhausted Actionable errors produce an event, and exactly one.

use std::time::Duration;

use tokio::time::Instant;

use tracing::{debug, error};

use crate::deployment::DeploymentRecord;
use crate::error::{ErrorClass, ReconcileError};
use crate::policies::classify::classify;
use crate::recorder::{EventSinkRef, REASON_FAILED_RETRY};

/// Retries are abandoned once more than this many failures were recorded.
pub const MAX_RECORDED_FAILURES: u32 = 1;

/// Per-key retry bookkeeping.
#[derive(Clone, Debug)]
pub struct RetryState {
    /// Failures recorded for the key so far.
    pub count: u32,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
    /// When the first recorded failure happened.
    pub started_at: Instant,
}

impl RetryState {
    /// State before any failure was recorded.
    pub fn new() -> Self {
        Self {
            count: 0,
            last_error: None,
            started_at: Instant::now(),
        }
    }

    /// State after recording `err` on top of `self`.
    pub fn next(&self, err: &ReconcileError) -> Self {
        Self {
            count: self.count.saturating_add(1),
            last_error: Some(err.to_string()),
            started_at: self.started_at,
        }
    }

    /// Time since the first recorded failure.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}

/// Decides retry vs. abandon and reports exhausted actionable failures.
#[derive(Clone)]
pub struct RetryPolicy {
    sink: EventSinkRef,
}

impl RetryPolicy {
    pub fn new(sink: EventSinkRef) -> Self {
        Self { sink }
    }

    /// Returns `true` if `record` should be attempted again after `err`.
    ///
    /// `retry` is the state **before** this failure (count 0 on the first one).
    pub fn should_retry(
        &self,
        record: &DeploymentRecord,
        err: &ReconcileError,
        retry: &RetryState,
    ) -> bool {
        let class = classify(err);
        if class == ErrorClass::Fatal {
            error!(object = %record.key(), error = %err, "fatal reconcile error, not retrying");
            return false;
        }

        if retry.count > MAX_RECORDED_FAILURES {
            if class == ErrorClass::Actionable {
                self.sink.emit_warning(
                    record,
                    REASON_FAILED_RETRY,
                    &format!("About to stop retrying {}: {}", record.name(), err),
                );
            }
            debug!(
                object = %record.key(),
                attempts = retry.count + 1,
                class = class.as_label(),
                retrying_for = ?retry.elapsed(),
                "retries exhausted"
            );
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::deployment::{ObjectKey, StrategyDescriptor};
    use crate::recorder::MemorySink;

    fn setup() -> (RetryPolicy, Arc<MemorySink>, DeploymentRecord) {
        let sink = Arc::new(MemorySink::new());
        let policy = RetryPolicy::new(sink.clone());
        let record = DeploymentRecord::new(ObjectKey::new("ns", "web-1"), StrategyDescriptor::Rolling);
        (policy, sink, record)
    }

    fn state(count: u32) -> RetryState {
        RetryState {
            count,
            ..RetryState::new()
        }
    }

    #[test]
    fn fatal_never_retries_and_never_reports() {
        let (policy, sink, record) = setup();
        let err = ReconcileError::fatal("undecodable config");

        for count in [0, 1, 2, 5] {
            assert!(!policy.should_retry(&record, &err, &state(count)));
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn actionable_retries_while_under_threshold() {
        let (policy, sink, record) = setup();
        let err = ReconcileError::actionable("deployer pod failed");

        assert!(policy.should_retry(&record, &err, &state(0)));
        assert!(policy.should_retry(&record, &err, &state(1)));
        assert!(sink.is_empty());
    }

    #[test]
    fn actionable_exhausted_emits_one_warning() {
        let (policy, sink, record) = setup();
        let err = ReconcileError::actionable("deployer pod failed");

        assert!(!policy.should_retry(&record, &err, &state(2)));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key, ObjectKey::new("ns", "web-1"));
        assert_eq!(events[0].reason, REASON_FAILED_RETRY);
        assert_eq!(
            events[0].message,
            "About to stop retrying web-1: deployer pod failed"
        );
    }

    #[test]
    fn transient_exhausted_is_silent() {
        let (policy, sink, record) = setup();
        let err = ReconcileError::transient("store busy");

        assert!(policy.should_retry(&record, &err, &state(0)));
        assert!(policy.should_retry(&record, &err, &state(1)));
        assert!(!policy.should_retry(&record, &err, &state(2)));
        assert!(!policy.should_retry(&record, &err, &state(7)));
        assert!(sink.is_empty());
    }

    #[test]
    fn next_state_counts_and_remembers_error() {
        let first = RetryState::new();
        let second = first.next(&ReconcileError::transient("busy"));

        assert_eq!(second.count, 1);
        assert_eq!(second.last_error.as_deref(), Some("busy"));
        assert_eq!(second.started_at, first.started_at);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_counts_from_first_failure() {
        let first = RetryState::new().next(&ReconcileError::transient("busy"));
        tokio::time::advance(Duration::from_secs(5)).await;
        let second = first.next(&ReconcileError::transient("busy"));
        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(second.elapsed(), Duration::from_secs(7));
    }
}
