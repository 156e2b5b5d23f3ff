//! # Strategy → deployer container resolution.
//!
//! ```text
//! Recreate / Rolling ──► image = configured deployer image
//!                        env   = base environment
//!
//! Custom{image, env} ──► image = strategy image
//!                        env   = base environment ++ strategy env
//! ```
//!
//! ## Rules
//! - Base entries always come first, strategy entries after.
//! - Order within each source is preserved.
//! - No dedup and no override by name: a strategy entry with the same name as
//!   a base entry is appended, not merged.

use super::strategy::{EnvVar, StrategyDescriptor};

/// Image and environment of the container that executes a strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployerContainerSpec {
    pub image: String,
    pub environment: Vec<EnvVar>,
}

/// Resolves the deployer container for `strategy`.
///
/// `deployer_image` is only used by the built-in strategies.
///
/// # Example
/// ```
/// use deployvisor::{EnvVar, StrategyDescriptor, resolve};
///
/// let base = vec![EnvVar::new("A", "1")];
/// let spec = resolve(
///     "deployer:latest",
///     &base,
///     &StrategyDescriptor::custom("X", vec![EnvVar::new("C", "3")]),
/// );
/// assert_eq!(spec.image, "X");
/// assert_eq!(spec.environment, vec![EnvVar::new("A", "1"), EnvVar::new("C", "3")]);
/// ```
pub fn resolve(
    deployer_image: &str,
    base_environment: &[EnvVar],
    strategy: &StrategyDescriptor,
) -> DeployerContainerSpec {
    let mut environment = base_environment.to_vec();

    match strategy {
        StrategyDescriptor::Recreate | StrategyDescriptor::Rolling => DeployerContainerSpec {
            image: deployer_image.to_string(),
            environment,
        },
        StrategyDescriptor::Custom(params) => {
            environment.extend(params.environment.iter().cloned());
            DeployerContainerSpec {
                image: params.image.clone(),
                environment,
            }
        }
    }
}

/// Resolver bound to the controller-wide deployer image and base environment.
#[derive(Clone, Debug)]
pub struct StrategyResolver {
    deployer_image: String,
    base_environment: Vec<EnvVar>,
}

impl StrategyResolver {
    pub fn new(deployer_image: impl Into<String>, base_environment: Vec<EnvVar>) -> Self {
        Self {
            deployer_image: deployer_image.into(),
            base_environment,
        }
    }

    /// See [`resolve`].
    pub fn resolve(&self, strategy: &StrategyDescriptor) -> DeployerContainerSpec {
        resolve(&self.deployer_image, &self.base_environment, strategy)
    }

    pub fn deployer_image(&self) -> &str {
        &self.deployer_image
    }

    pub fn base_environment(&self) -> &[EnvVar] {
        &self.base_environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Vec<EnvVar> {
        pairs.iter().map(|(k, v)| EnvVar::new(*k, *v)).collect()
    }

    #[test]
    fn recreate_uses_deployer_image_and_base_env() {
        let resolver = StrategyResolver::new("deployer:v1", env(&[("A", "1"), ("B", "2")]));
        let spec = resolver.resolve(&StrategyDescriptor::Recreate);

        assert_eq!(spec.image, "deployer:v1");
        assert_eq!(spec.environment, env(&[("A", "1"), ("B", "2")]));
    }

    #[test]
    fn rolling_uses_deployer_image_and_base_env() {
        let resolver = StrategyResolver::new("deployer:v1", env(&[("A", "1")]));
        let spec = resolver.resolve(&StrategyDescriptor::Rolling);

        assert_eq!(spec.image, "deployer:v1");
        assert_eq!(spec.environment, env(&[("A", "1")]));
    }

    #[test]
    fn custom_appends_strategy_env_after_base() {
        let resolver = StrategyResolver::new("deployer:v1", env(&[("A", "1")]));
        let spec = resolver.resolve(&StrategyDescriptor::custom("X", env(&[("C", "3")])));

        assert_eq!(spec.image, "X");
        assert_eq!(spec.environment, env(&[("A", "1"), ("C", "3")]));
    }

    #[test]
    fn custom_does_not_merge_duplicate_names() {
        let resolver = StrategyResolver::new("deployer:v1", env(&[("A", "1"), ("B", "2")]));
        let strategy = StrategyDescriptor::custom("X", env(&[("B", "override"), ("A", "again")]));
        let spec = resolver.resolve(&strategy);

        assert_eq!(
            spec.environment,
            env(&[("A", "1"), ("B", "2"), ("B", "override"), ("A", "again")])
        );
    }

    #[test]
    fn empty_base_env() {
        let spec = resolve("d", &[], &StrategyDescriptor::custom("X", env(&[("C", "3")])));
        assert_eq!(spec.environment, env(&[("C", "3")]));
    }

    #[test]
    fn base_env_is_not_mutated() {
        let base = env(&[("A", "1")]);
        let _ = resolve("d", &base, &StrategyDescriptor::custom("X", env(&[("C", "3")])));
        assert_eq!(base, env(&[("A", "1")]));
    }
}
