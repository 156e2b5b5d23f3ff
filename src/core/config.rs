//! # Controller configuration.
//!
//! [`Config`] centralizes what the controller is told from outside:
//! - **Deployer**: image for built-in strategies, base environment, service account
//! - **Retry pacing**: token-bucket burst and refill interval
//! - **Runtime**: event bus capacity and shutdown grace period
//!
//! ## Sentinel values
//! - `grace = 0s` → do not wait for the control loop on shutdown
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::deployment::{DeployerTemplate, EnvVar, StrategyResolver};
use crate::error::ConfigError;

/// Token-bucket settings for retry requeues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Bucket capacity; also the number of requeues allowed in a burst.
    pub burst: u32,
    /// One token is credited per interval.
    pub refill_every: Duration,
}

impl Default for RateLimitConfig {
    /// Burst 10, one token per second.
    fn default() -> Self {
        Self {
            burst: 10,
            refill_every: Duration::from_secs(1),
        }
    }
}

/// Controller configuration.
///
/// All fields are public. `deployer_image` has no usable default and must be
/// set; [`Config::validate`] (called by the builder) enforces it.
#[derive(Clone, Debug)]
pub struct Config {
    /// Image used by the `Recreate` and `Rolling` strategies.
    pub deployer_image: String,

    /// Environment injected into every deployer container, before any
    /// strategy-supplied entries.
    pub environment: Vec<EnvVar>,

    /// Service account deployer pods run as. Passed through verbatim.
    pub service_account: String,

    /// Pacing of retry requeues across all keys.
    pub rate_limit: RateLimitConfig,

    /// Capacity of the internal event bus ring buffer.
    pub bus_capacity: usize,

    /// Maximum time to wait for the control loop to stop on shutdown.
    ///
    /// An in-flight reconciliation is never interrupted; if it outlives the
    /// grace period, `run` returns `RuntimeError::GraceExceeded`.
    pub grace: Duration,
}

impl Config {
    /// Default configuration with the given deployer image.
    pub fn new(deployer_image: impl Into<String>) -> Self {
        Self {
            deployer_image: deployer_image.into(),
            ..Self::default()
        }
    }

    /// Checks the configuration; the builder refuses invalid configs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deployer_image.trim().is_empty() {
            return Err(ConfigError::EmptyDeployerImage);
        }
        if let Some(index) = self.environment.iter().position(|e| e.name.is_empty()) {
            return Err(ConfigError::EmptyEnvName { index });
        }
        if self.rate_limit.burst == 0 {
            return Err(ConfigError::ZeroBurst);
        }
        if self.rate_limit.refill_every.is_zero() {
            return Err(ConfigError::ZeroRefillInterval);
        }
        Ok(())
    }

    /// Resolver bound to this config's deployer image and environment.
    pub fn resolver(&self) -> StrategyResolver {
        StrategyResolver::new(self.deployer_image.clone(), self.environment.clone())
    }

    /// Deployer pod template bound to this config.
    pub fn deployer_template(&self) -> DeployerTemplate {
        DeployerTemplate::new(self.resolver(), self.service_account.clone())
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `deployer_image = ""` (must be set)
    /// - `environment = []`, `service_account = ""`
    /// - `rate_limit = RateLimitConfig::default()` (burst 10, 1 token/s)
    /// - `bus_capacity = 1024`
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            deployer_image: String::new(),
            environment: Vec::new(),
            service_account: String::new(),
            rate_limit: RateLimitConfig::default(),
            bus_capacity: 1024,
            grace: Duration::from_secs(30),
        }
    }
}
