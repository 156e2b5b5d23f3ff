//! # Resource event sink.
//!
//! [`EventSink`] is where operator-visible events attached to a deployment go
//! (the store's event API in a real cluster). Emission is fire-and-forget: the
//! controller never looks at a result.
//!
//! Provided sinks:
//! - [`TracingSink`] writes events as `tracing` warnings;
//! - [`MemorySink`] keeps them in memory (tests, dry runs).

use std::sync::{Arc, Mutex};

use crate::deployment::{DeploymentRecord, ObjectKey};

/// Component name attached to every recorded event.
pub const EVENT_COMPONENT: &str = "deployments-controller";

/// Reason used when the controller stops retrying an actionable failure.
pub const REASON_FAILED_RETRY: &str = "FailedRetry";

/// Sink for warning events attached to a deployment.
pub trait EventSink: Send + Sync + 'static {
    /// Emits a warning about `record`.
    fn emit_warning(&self, record: &DeploymentRecord, reason: &str, message: &str);
}

/// Shared sink handle.
pub type EventSinkRef = Arc<dyn EventSink>;

/// Writes events through `tracing` at warn level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit_warning(&self, record: &DeploymentRecord, reason: &str, message: &str) {
        tracing::warn!(
            component = EVENT_COMPONENT,
            object = %record.key(),
            reason,
            "{message}"
        );
    }
}

/// Event captured by [`MemorySink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    pub key: ObjectKey,
    pub reason: String,
    pub message: String,
}

/// Keeps every emitted event in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all events emitted so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn emit_warning(&self, record: &DeploymentRecord, reason: &str, message: &str) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedEvent {
                key: record.key().clone(),
                reason: reason.to_string(),
                message: message.to_string(),
            });
    }
}
