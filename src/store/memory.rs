//! # In-memory resource store.
//!
//! [`MemoryStore`] keeps deployments and pods in maps behind async locks.
//! It backs tests and dry runs, and can be told to fail upcoming calls with
//! [`MemoryStore::fail_next`] to exercise retry paths.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::deployment::{DeploymentRecord, ObjectKey, Pod};
use crate::error::StoreError;

use super::client::ResourceStore;

const DEPLOYMENT: &str = "deployment";
const POD: &str = "pod";

/// Map-backed [`ResourceStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    deployments: RwLock<BTreeMap<ObjectKey, DeploymentRecord>>,
    pods: RwLock<BTreeMap<ObjectKey, Pod>>,
    failures: Mutex<VecDeque<StoreError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a deployment without going through the trait.
    pub async fn insert_deployment(&self, record: DeploymentRecord) {
        self.deployments
            .write()
            .await
            .insert(record.key().clone(), record);
    }

    /// Makes the next store call fail with `err`. Queued failures are used in order.
    pub fn fail_next(&self, err: StoreError) {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(err);
    }

    /// Snapshot of all pods, ordered by key.
    pub async fn pods(&self) -> Vec<Pod> {
        self.pods.read().await.values().cloned().collect()
    }

    /// Snapshot of all deployments, ordered by key.
    pub async fn deployments(&self) -> Vec<DeploymentRecord> {
        self.deployments.read().await.values().cloned().collect()
    }

    fn injected(&self) -> Result<(), StoreError> {
        match self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn not_found(kind: &'static str, key: &ObjectKey) -> StoreError {
    StoreError::NotFound {
        kind,
        key: key.to_string(),
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<DeploymentRecord, StoreError> {
        self.injected()?;
        let key = ObjectKey::new(namespace, name);
        self.deployments
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| not_found(DEPLOYMENT, &key))
    }

    async fn update_deployment(
        &self,
        namespace: &str,
        record: DeploymentRecord,
    ) -> Result<DeploymentRecord, StoreError> {
        self.injected()?;
        let key = ObjectKey::new(namespace, record.name());
        let mut deployments = self.deployments.write().await;
        match deployments.get_mut(&key) {
            Some(stored) => {
                *stored = record.clone();
                Ok(record)
            }
            None => Err(not_found(DEPLOYMENT, &key)),
        }
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, StoreError> {
        self.injected()?;
        let key = ObjectKey::new(namespace, name);
        self.pods
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| not_found(POD, &key))
    }

    async fn create_pod(&self, namespace: &str, mut pod: Pod) -> Result<Pod, StoreError> {
        self.injected()?;
        pod.namespace = namespace.to_string();
        let key = ObjectKey::new(namespace, pod.name.clone());
        let mut pods = self.pods.write().await;
        if pods.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: POD,
                key: key.to_string(),
            });
        }
        pods.insert(key, pod.clone());
        Ok(pod)
    }

    async fn update_pod(&self, namespace: &str, mut pod: Pod) -> Result<Pod, StoreError> {
        self.injected()?;
        pod.namespace = namespace.to_string();
        let key = ObjectKey::new(namespace, pod.name.clone());
        let mut pods = self.pods.write().await;
        match pods.get_mut(&key) {
            Some(stored) => {
                *stored = pod.clone();
                Ok(pod)
            }
            None => Err(not_found(POD, &key)),
        }
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.injected()?;
        let key = ObjectKey::new(namespace, name);
        match self.pods.write().await.remove(&key) {
            Some(_) => Ok(()),
            None => Err(not_found(POD, &key)),
        }
    }

    async fn list_deployer_pods(
        &self,
        namespace: &str,
        deployment: &str,
    ) -> Result<Vec<Pod>, StoreError> {
        self.injected()?;
        Ok(self
            .pods
            .read()
            .await
            .values()
            .filter(|pod| pod.namespace == namespace && pod.deployer_for() == Some(deployment))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::{StrategyDescriptor, StrategyResolver, deployer_pod};

    fn record(name: &str) -> DeploymentRecord {
        DeploymentRecord::new(ObjectKey::new("ns", name), StrategyDescriptor::Recreate)
    }

    fn pod_for(name: &str) -> Pod {
        let resolver = StrategyResolver::new("deployer:v1", vec![]);
        let rec = record(name);
        deployer_pod(&rec, resolver.resolve(&rec.strategy), "sa")
    }

    #[tokio::test]
    async fn update_requires_existing_deployment() {
        let store = MemoryStore::new();
        let err = store.update_deployment("ns", record("web-1")).await.unwrap_err();
        assert!(err.is_not_found());

        store.insert_deployment(record("web-1")).await;
        let updated = store
            .update_deployment("ns", record("web-1").with_status("Running"))
            .await
            .unwrap();
        assert_eq!(updated.status, "Running");
        assert_eq!(
            store.get_deployment("ns", "web-1").await.unwrap().status,
            "Running"
        );
    }

    #[tokio::test]
    async fn create_pod_twice_conflicts() {
        let store = MemoryStore::new();
        store.create_pod("ns", pod_for("web-1")).await.unwrap();

        let err = store.create_pod("ns", pod_for("web-1")).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::AlreadyExists {
                kind: "pod",
                key: "ns/web-1-deploy".into()
            }
        );
    }

    #[tokio::test]
    async fn pod_update_and_delete() {
        let store = MemoryStore::new();
        let mut pod = store.create_pod("ns", pod_for("web-1")).await.unwrap();
        pod.service_account = "other".into();

        store.update_pod("ns", pod).await.unwrap();
        assert_eq!(
            store.get_pod("ns", "web-1-deploy").await.unwrap().service_account,
            "other"
        );

        store.delete_pod("ns", "web-1-deploy").await.unwrap();
        assert!(store.get_pod("ns", "web-1-deploy").await.unwrap_err().is_not_found());
        assert!(store.delete_pod("ns", "web-1-deploy").await.is_err());
    }

    #[tokio::test]
    async fn lists_only_pods_of_the_deployment() {
        let store = MemoryStore::new();
        store.create_pod("ns", pod_for("web-1")).await.unwrap();
        store.create_pod("ns", pod_for("web-2")).await.unwrap();
        store.create_pod("other", pod_for("web-1")).await.unwrap();

        let pods = store.list_deployer_pods("ns", "web-1").await.unwrap();
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].name, "web-1-deploy");
        assert_eq!(pods[0].namespace, "ns");
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let store = MemoryStore::new();
        store.insert_deployment(record("web-1")).await;
        store.fail_next(StoreError::Unavailable {
            reason: "etcd leader change".into(),
        });

        assert!(matches!(
            store.get_deployment("ns", "web-1").await,
            Err(StoreError::Unavailable { .. })
        ));
        assert!(store.get_deployment("ns", "web-1").await.is_ok());
    }
}
