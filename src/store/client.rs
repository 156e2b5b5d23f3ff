//! # Resource-store capability set.
//!
//! [`ResourceStore`] is everything a reconciliation body may ask of the
//! cluster: read/update deployments and manage their deployer pods.

use std::sync::Arc;

use async_trait::async_trait;

use crate::deployment::{DeploymentRecord, Pod};
use crate::error::StoreError;

/// # Access to deployment records and deployer pods.
///
/// Implementations must be cheap to share (`Arc<dyn ResourceStore>`); every
/// call is independent and may block on I/O.
///
/// # Example
/// ```
/// use deployvisor::{DeploymentRecord, MemoryStore, ObjectKey, ResourceStore, StrategyDescriptor};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let store = MemoryStore::new();
///     let record = DeploymentRecord::new(ObjectKey::new("ns", "web-1"), StrategyDescriptor::Rolling);
///     store.insert_deployment(record.clone()).await;
///
///     let got = store.get_deployment("ns", "web-1").await.unwrap();
///     assert_eq!(got, record);
/// }
/// ```
#[async_trait]
pub trait ResourceStore: Send + Sync + 'static {
    async fn get_deployment(&self, namespace: &str, name: &str)
    -> Result<DeploymentRecord, StoreError>;

    /// Replaces the stored record; fails with `NotFound` if it does not exist.
    async fn update_deployment(
        &self,
        namespace: &str,
        record: DeploymentRecord,
    ) -> Result<DeploymentRecord, StoreError>;

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, StoreError>;

    /// Fails with `AlreadyExists` if a pod with the same name exists.
    async fn create_pod(&self, namespace: &str, pod: Pod) -> Result<Pod, StoreError>;

    async fn update_pod(&self, namespace: &str, pod: Pod) -> Result<Pod, StoreError>;

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

    /// Pods in `namespace` labelled as deployer pods of `deployment`.
    async fn list_deployer_pods(
        &self,
        namespace: &str,
        deployment: &str,
    ) -> Result<Vec<Pod>, StoreError>;
}

/// Shared store handle.
pub type StoreRef = Arc<dyn ResourceStore>;
