//! # Reconciliation bodies.
//!
//! - [`Reconcile`] - trait for one reconciliation attempt
//! - [`ReconcileFn`] - closure-backed implementation
//! - [`ReconcileRef`] - shared handle (`Arc<dyn Reconcile>`)

mod reconciler;
mod reconcile_fn;

pub use reconciler::{Reconcile, ReconcileRef};
pub use reconcile_fn::ReconcileFn;
