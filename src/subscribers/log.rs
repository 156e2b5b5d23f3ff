//! # Tracing subscriber for controller events.
//!
//! [`LogWriter`] renders runtime [`Event`]s through `tracing`:
//!
//! | Kind                                   | Level   |
//! |----------------------------------------|---------|
//! | queue / attempt start / success        | `debug` |
//! | failure, throttled or scheduled retry  | `info`  |
//! | abandoned retry, feed closed, overflow | `warn`  |
//! | grace exceeded, subscriber panic       | `error` |
//!
//! Install a `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see output.

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// `tracing`-backed event logger.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let key = e.key.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        let class = e.class.map(|c| c.as_label()).unwrap_or("-");

        match e.kind {
            EventKind::RecordEnqueued => debug!(key, "enqueued"),
            EventKind::RecordCoalesced => debug!(key, "coalesced with pending record"),
            EventKind::ReconcileStarting => debug!(key, attempt = e.attempt, "reconcile starting"),
            EventKind::ReconcileSucceeded => debug!(key, attempt = e.attempt, "reconcile succeeded"),
            EventKind::ReconcileFailed => {
                info!(key, attempt = e.attempt, class, error = reason, "reconcile failed")
            }
            EventKind::RetryThrottled => info!(key, delay_ms = e.delay_ms, "retry throttled"),
            EventKind::RetryScheduled => info!(key, next_attempt = e.attempt, "retry scheduled"),
            EventKind::RetryAbandoned => {
                warn!(key, attempt = e.attempt, class, error = reason, "retry abandoned")
            }
            EventKind::FeedClosed => warn!(reason, "watch feed closed"),
            EventKind::ShutdownRequested => info!("shutdown requested"),
            EventKind::AllStoppedWithin => info!("stopped within grace"),
            EventKind::GraceExceeded => error!("grace exceeded"),
            EventKind::SubscriberOverflow => warn!(subscriber = key, reason, "subscriber overflow"),
            EventKind::SubscriberPanicked => error!(subscriber = key, reason, "subscriber panicked"),
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
