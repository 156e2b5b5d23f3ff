//! # Deployment strategies.
//!
//! [`StrategyDescriptor`] says **what** a deployer pod runs:
//! - [`StrategyDescriptor::Recreate`] / [`StrategyDescriptor::Rolling`] use the
//!   controller-wide deployer image and carry no parameters of their own;
//! - [`StrategyDescriptor::Custom`] brings its own image and environment.
//!
//! Records arrive from the store with the strategy as a textual kind plus
//! optional custom parameters. [`StrategyDescriptor::from_parts`] is the
//! boundary where that raw shape is checked: an unknown kind, or `Custom`
//! without parameters, is a [`StrategyError`] and never falls back to a
//! default container.

use std::fmt;
use std::str::FromStr;

use crate::error::StrategyError;

/// Single environment entry of a container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Execution parameters of a custom strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomParams {
    /// Image the deployer container runs.
    pub image: String,
    /// Extra environment, appended after the controller's base environment.
    pub environment: Vec<EnvVar>,
}

/// Bare strategy discriminant, as named in stored records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Recreate,
    Rolling,
    Custom,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Recreate => "Recreate",
            StrategyKind::Rolling => "Rolling",
            StrategyKind::Custom => "Custom",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Recreate" => Ok(StrategyKind::Recreate),
            "Rolling" => Ok(StrategyKind::Rolling),
            "Custom" => Ok(StrategyKind::Custom),
            other => Err(StrategyError::UnknownKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// Deployment strategy of a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StrategyDescriptor {
    Recreate,
    Rolling,
    Custom(CustomParams),
}

impl StrategyDescriptor {
    /// Shorthand for a custom strategy.
    pub fn custom(image: impl Into<String>, environment: Vec<EnvVar>) -> Self {
        StrategyDescriptor::Custom(CustomParams {
            image: image.into(),
            environment,
        })
    }

    /// Builds a descriptor from the raw kind name and optional custom parameters.
    ///
    /// Parameters supplied for `Recreate`/`Rolling` are ignored; they have no
    /// execution parameters of their own.
    ///
    /// # Example
    /// ```
    /// use deployvisor::{StrategyDescriptor, StrategyError};
    ///
    /// assert_eq!(
    ///     StrategyDescriptor::from_parts("Rolling", None),
    ///     Ok(StrategyDescriptor::Rolling)
    /// );
    /// assert!(matches!(
    ///     StrategyDescriptor::from_parts("BlueGreen", None),
    ///     Err(StrategyError::UnknownKind { .. })
    /// ));
    /// ```
    pub fn from_parts(kind: &str, custom: Option<CustomParams>) -> Result<Self, StrategyError> {
        match kind.parse::<StrategyKind>()? {
            StrategyKind::Recreate => Ok(StrategyDescriptor::Recreate),
            StrategyKind::Rolling => Ok(StrategyDescriptor::Rolling),
            StrategyKind::Custom => custom
                .map(StrategyDescriptor::Custom)
                .ok_or(StrategyError::MissingCustomParams),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyDescriptor::Recreate => StrategyKind::Recreate,
            StrategyDescriptor::Rolling => StrategyKind::Rolling,
            StrategyDescriptor::Custom(_) => StrategyKind::Custom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        for kind in [
            StrategyKind::Recreate,
            StrategyKind::Rolling,
            StrategyKind::Custom,
        ] {
            assert_eq!(kind.as_str().parse::<StrategyKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = StrategyDescriptor::from_parts("BlueGreen", None).unwrap_err();
        assert_eq!(
            err,
            StrategyError::UnknownKind {
                kind: "BlueGreen".into()
            }
        );
    }

    #[test]
    fn kind_names_are_case_sensitive() {
        assert!("rolling".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn custom_without_params_is_rejected() {
        assert_eq!(
            StrategyDescriptor::from_parts("Custom", None),
            Err(StrategyError::MissingCustomParams)
        );
    }

    #[test]
    fn custom_with_params() {
        let params = CustomParams {
            image: "registry/deployer:v2".into(),
            environment: vec![EnvVar::new("MODE", "canary")],
        };
        let strategy = StrategyDescriptor::from_parts("Custom", Some(params.clone())).unwrap();
        assert_eq!(strategy, StrategyDescriptor::Custom(params));
        assert_eq!(strategy.kind(), StrategyKind::Custom);
    }

    #[test]
    fn builtin_kinds_ignore_custom_params() {
        let params = CustomParams {
            image: "ignored".into(),
            environment: vec![],
        };
        assert_eq!(
            StrategyDescriptor::from_parts("Recreate", Some(params)),
            Ok(StrategyDescriptor::Recreate)
        );
    }
}
