//! # Reconciliation body abstraction.
//!
//! [`Reconcile`] is the domain logic run for one deployment record: it
//! inspects the record and issues store mutations. The control loop only
//! cares whether it returned `Ok` or which [`ReconcileError`] it returned.

use std::sync::Arc;

use async_trait::async_trait;

use crate::deployment::DeploymentRecord;
use crate::error::ReconcileError;

/// # One reconciliation pass over a deployment record.
///
/// Implementations pick the [`ReconcileError`] variant that matches the
/// failure; that choice alone decides whether the key is retried and whether
/// an operator-visible event is emitted once retries run out.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use deployvisor::{DeploymentRecord, Reconcile, ReconcileError};
///
/// struct Noop;
///
/// #[async_trait]
/// impl Reconcile for Noop {
///     fn name(&self) -> &str { "noop" }
///
///     async fn reconcile(&self, _record: &DeploymentRecord) -> Result<(), ReconcileError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Reconcile: Send + Sync + 'static {
    /// Human-readable name (for logs).
    fn name(&self) -> &str;

    /// Runs one attempt for `record`.
    async fn reconcile(&self, record: &DeploymentRecord) -> Result<(), ReconcileError>;
}

/// Shared reconciler handle.
pub type ReconcileRef = Arc<dyn Reconcile>;
