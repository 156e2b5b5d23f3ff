//! # Deployment data model and deployer resolution.
//!
//! - [`ObjectKey`], [`DeploymentRecord`]: identity and observed state of a deployment
//! - [`StrategyDescriptor`], [`StrategyKind`], [`CustomParams`], [`EnvVar`]: what a deployer runs
//! - [`StrategyResolver`], [`resolve`]: strategy → [`DeployerContainerSpec`]
//! - [`Pod`], [`deployer_pod`], [`DeployerTemplate`]: deployer pods tied to their deployment by label

mod pod;
mod record;
mod resolver;
mod strategy;

pub use pod::{
    Container, DEPLOYER_CONTAINER_NAME, DEPLOYER_POD_FOR_LABEL, DeployerTemplate, Pod,
    deployer_pod, deployer_pod_name,
};
pub use record::{DeploymentRecord, ObjectKey};
pub use resolver::{DeployerContainerSpec, StrategyResolver, resolve};
pub use strategy::{CustomParams, EnvVar, StrategyDescriptor, StrategyKind};
