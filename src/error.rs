//! Error types used by the controller runtime and reconciliation bodies.
//!
//! - [`ReconcileError`]: errors returned by a reconciliation attempt; the
//!   variant fixes its [`ErrorClass`] at construction time.
//! - [`StoreError`]: resource-store failures (always transient).
//! - [`StrategyError`]: malformed strategy in a record (always fatal).
//! - [`ConfigError`]: invalid [`Config`](crate::Config), reported by the builder.
//! - [`RuntimeError`]: failures of the controller runtime itself.
//!
//! Each type provides `as_label()`, a stable snake_case label for logs/metrics.

use std::time::Duration;
use thiserror::Error;

/// Three-way classification governing retry and reporting behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// No retry can fix it; abandon at once, no event.
    Fatal,
    /// Retryable, but surfaced as a warning event once retries are exhausted.
    Actionable,
    /// Retryable, dropped silently once retries are exhausted.
    Transient,
}

impl ErrorClass {
    pub fn as_label(&self) -> &'static str {
        match self {
            ErrorClass::Fatal => "fatal",
            ErrorClass::Actionable => "actionable",
            ErrorClass::Transient => "transient",
        }
    }
}

/// # Errors produced by a reconciliation attempt.
///
/// Construct the variant that matches what the caller knows about the
/// failure; [`classify`](crate::classify) never looks at the message.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Condition no retry can fix (e.g. undecodable record).
    #[error("fatal error (no retry): {reason}")]
    Fatal { reason: String },

    /// Retryable condition an operator should hear about if it persists.
    #[error("{reason}")]
    Actionable { reason: String },

    /// Retryable condition not worth a standing event.
    #[error("{reason}")]
    Transient { reason: String },

    /// The record's strategy cannot be turned into a deployer container.
    #[error("invalid strategy: {0}")]
    InvalidStrategy(#[from] StrategyError),

    /// Resource store call failed.
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

impl ReconcileError {
    pub fn fatal(reason: impl Into<String>) -> Self {
        ReconcileError::Fatal {
            reason: reason.into(),
        }
    }

    pub fn actionable(reason: impl Into<String>) -> Self {
        ReconcileError::Actionable {
            reason: reason.into(),
        }
    }

    pub fn transient(reason: impl Into<String>) -> Self {
        ReconcileError::Transient {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use deployvisor::ReconcileError;
    ///
    /// assert_eq!(ReconcileError::actionable("pod failed").as_label(), "reconcile_actionable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ReconcileError::Fatal { .. } => "reconcile_fatal",
            ReconcileError::Actionable { .. } => "reconcile_actionable",
            ReconcileError::Transient { .. } => "reconcile_transient",
            ReconcileError::InvalidStrategy(_) => "reconcile_invalid_strategy",
            ReconcileError::Store(_) => "reconcile_store",
        }
    }
}

/// # Errors produced by a [`ResourceStore`](crate::ResourceStore).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: &'static str, key: String },

    /// Optimistic concurrency failure: the stored object changed underneath.
    #[error("{kind} {key} was modified concurrently")]
    Conflict { kind: &'static str, key: String },

    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl StoreError {
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "store_not_found",
            StoreError::AlreadyExists { .. } => "store_already_exists",
            StoreError::Conflict { .. } => "store_conflict",
            StoreError::Unavailable { .. } => "store_unavailable",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// # Malformed strategy descriptor.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    #[error("unknown strategy kind {kind:?}")]
    UnknownKind { kind: String },

    #[error("custom strategy without custom parameters")]
    MissingCustomParams,
}

/// # Invalid controller configuration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("deployer image must not be empty")]
    EmptyDeployerImage,

    #[error("environment entry #{index} has an empty name")]
    EmptyEnvName { index: usize },

    #[error("rate limit burst must be at least 1")]
    ZeroBurst,

    #[error("rate limit refill interval must be greater than zero")]
    ZeroRefillInterval,

    #[error("controller has no reconciler")]
    MissingReconciler,
}

/// # Errors produced by the controller runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; the control loop was still busy.
    #[error("shutdown timeout {grace:?} exceeded; forcing termination")]
    GraceExceeded { grace: Duration },

    /// [`Controller::run`](crate::Controller::run) was called more than once.
    #[error("controller already running")]
    AlreadyRunning,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::AlreadyRunning => "runtime_already_running",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_into_reconcile_error() {
        let err: ReconcileError = StoreError::Unavailable {
            reason: "connection reset".into(),
        }
        .into();
        assert_eq!(err.as_label(), "reconcile_store");
        assert_eq!(err.to_string(), "store: store unavailable: connection reset");
    }

    #[test]
    fn strategy_error_message() {
        let err: ReconcileError = StrategyError::UnknownKind {
            kind: "BlueGreen".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invalid strategy: unknown strategy kind \"BlueGreen\""
        );
    }

    #[test]
    fn actionable_message_is_reason() {
        assert_eq!(
            ReconcileError::actionable("deployer pod failed").to_string(),
            "deployer pod failed"
        );
    }
}
