//! # Function-backed reconciler (`ReconcileFn`)
//!
//! [`ReconcileFn`] wraps a closure `F: Fn(DeploymentRecord) -> Fut`, producing
//! a fresh future per attempt. The closure receives an owned copy of the
//! record, so the future owns its state; share anything else through `Arc`.
//!
//! ## Example
//! ```rust
//! use deployvisor::{DeploymentRecord, Reconcile, ReconcileError, ReconcileFn, ReconcileRef};
//!
//! let r: ReconcileRef = ReconcileFn::arc("status-check", |record: DeploymentRecord| async move {
//!     if record.status.is_empty() {
//!         return Err(ReconcileError::transient("status not populated yet"));
//!     }
//!     Ok(())
//! });
//!
//! assert_eq!(r.name(), "status-check");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::deployment::DeploymentRecord;
use crate::error::ReconcileError;

use super::reconciler::Reconcile;

/// Function-backed reconciler.
pub struct ReconcileFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ReconcileFn<F> {
    /// Creates a new function-backed reconciler.
    ///
    /// Prefer [`ReconcileFn::arc`] when you immediately need a
    /// [`ReconcileRef`](crate::ReconcileRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the reconciler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Reconcile for ReconcileFn<F>
where
    F: Fn(DeploymentRecord) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ReconcileError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn reconcile(&self, record: &DeploymentRecord) -> Result<(), ReconcileError> {
        (self.f)(record.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::deployment::{ObjectKey, StrategyDescriptor};

    #[tokio::test]
    async fn each_attempt_runs_the_closure() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let r = ReconcileFn::arc("counting", move |_record: DeploymentRecord| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), ReconcileError>(())
            }
        });

        let record = DeploymentRecord::new(ObjectKey::new("ns", "a"), StrategyDescriptor::Rolling);
        r.reconcile(&record).await.unwrap();
        r.reconcile(&record).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
