//! # Deployer pods.
//!
//! A deployer pod executes one deployment's strategy. It is tied to its
//! deployment through the [`DEPLOYER_POD_FOR_LABEL`] label, which is what
//! [`ResourceStore::list_deployer_pods`](crate::ResourceStore::list_deployer_pods)
//! filters on.

use std::collections::BTreeMap;

use super::record::DeploymentRecord;
use super::resolver::{DeployerContainerSpec, StrategyResolver};
use super::strategy::EnvVar;

/// Label correlating a deployer pod with the deployment it runs for.
pub const DEPLOYER_POD_FOR_LABEL: &str = "deployer-pod-for.name";

/// Name of the single container in a deployer pod.
pub const DEPLOYER_CONTAINER_NAME: &str = "deployment";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container {
    pub name: String,
    pub image: String,
    pub env: Vec<EnvVar>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pod {
    pub namespace: String,
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub containers: Vec<Container>,
    /// Passed through from configuration, never interpreted.
    pub service_account: String,
}

impl Pod {
    /// Name of the deployment this pod deploys, if it is a deployer pod.
    pub fn deployer_for(&self) -> Option<&str> {
        self.labels.get(DEPLOYER_POD_FOR_LABEL).map(String::as_str)
    }
}

/// Name of the deployer pod for `deployment`.
pub fn deployer_pod_name(deployment: &str) -> String {
    format!("{deployment}-deploy")
}

/// Builds the deployer pod for `record` running `container`.
pub fn deployer_pod(
    record: &DeploymentRecord,
    container: DeployerContainerSpec,
    service_account: &str,
) -> Pod {
    let mut labels = BTreeMap::new();
    labels.insert(DEPLOYER_POD_FOR_LABEL.to_string(), record.name().to_string());

    Pod {
        namespace: record.namespace().to_string(),
        name: deployer_pod_name(record.name()),
        labels,
        containers: vec![Container {
            name: DEPLOYER_CONTAINER_NAME.to_string(),
            image: container.image,
            env: container.environment,
        }],
        service_account: service_account.to_string(),
    }
}

/// Resolver plus service account: everything needed to build deployer pods.
#[derive(Clone, Debug)]
pub struct DeployerTemplate {
    resolver: StrategyResolver,
    service_account: String,
}

impl DeployerTemplate {
    pub fn new(resolver: StrategyResolver, service_account: impl Into<String>) -> Self {
        Self {
            resolver,
            service_account: service_account.into(),
        }
    }

    /// Deployer pod for `record`, running its strategy's container.
    pub fn pod_for(&self, record: &DeploymentRecord) -> Pod {
        deployer_pod(
            record,
            self.resolver.resolve(&record.strategy),
            &self.service_account,
        )
    }

    pub fn resolver(&self) -> &StrategyResolver {
        &self.resolver
    }

    pub fn service_account(&self) -> &str {
        &self.service_account
    }
}
