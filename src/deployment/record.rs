//! # Deployment records and their identity.
//!
//! A [`DeploymentRecord`] is owned by the external resource store. The
//! controller only reads it, hands it to the reconciliation body, and keys
//! queue/retry bookkeeping by its [`ObjectKey`].

use std::collections::BTreeMap;
use std::fmt;

use super::strategy::StrategyDescriptor;

/// Unique identity of a resource: `namespace` + `name`.
///
/// Displays as `namespace/name`, or just `name` for cluster-scoped objects
/// (empty namespace).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

/// Observed deployment as stored by the resource store.
///
/// `status` and `annotations` are opaque to the controller; only the
/// reconciliation body interprets them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentRecord {
    key: ObjectKey,
    /// Strategy the deployer pod must execute.
    pub strategy: StrategyDescriptor,
    /// Opaque lifecycle status.
    pub status: String,
    /// Opaque annotations, ordered by name.
    pub annotations: BTreeMap<String, String>,
}

impl DeploymentRecord {
    /// Creates a record with empty status and no annotations.
    pub fn new(key: ObjectKey, strategy: StrategyDescriptor) -> Self {
        Self {
            key,
            strategy,
            status: String::new(),
            annotations: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> &ObjectKey {
        &self.key
    }

    pub fn namespace(&self) -> &str {
        &self.key.namespace
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    /// Returns a copy with the given status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Returns a copy with an annotation set.
    pub fn with_annotation(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_includes_namespace() {
        assert_eq!(ObjectKey::new("prod", "web-1").to_string(), "prod/web-1");
    }

    #[test]
    fn key_display_cluster_scoped() {
        assert_eq!(ObjectKey::new("", "web-1").to_string(), "web-1");
    }

    #[test]
    fn record_accessors() {
        let rec = DeploymentRecord::new(ObjectKey::new("ns", "app-3"), StrategyDescriptor::Rolling)
            .with_status("Pending")
            .with_annotation("deployment.version", "3");

        assert_eq!(rec.namespace(), "ns");
        assert_eq!(rec.name(), "app-3");
        assert_eq!(rec.status, "Pending");
        assert_eq!(
            rec.annotations.get("deployment.version").map(String::as_str),
            Some("3")
        );
    }
}
