//! Object identity and import identifiers

use std::fmt;

use crate::error::{CoreError, Result};

const NAMESPACED_FORMAT: &str = "namespace/name";
const CLUSTER_FORMAT: &str = "name";

/// Reference to a single Kubernetes object of a known kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectRef {
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// State identifier: `namespace/name`, or `name` for cluster-scoped objects
    pub fn id(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}/{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    /// Parse an import identifier
    ///
    /// Namespaced kinds take `namespace/name`, cluster-scoped kinds take a
    /// bare `name`. Empty segments are rejected.
    pub fn parse_import_id(id: &str, namespaced: bool) -> Result<Self> {
        let parts: Vec<&str> = id.split('/').collect();

        match (namespaced, parts.as_slice()) {
            (true, [namespace, name]) if !namespace.is_empty() && !name.is_empty() => {
                Ok(Self::namespaced(*namespace, *name))
            }
            (false, [name]) if !name.is_empty() => Ok(Self::cluster(*name)),
            _ => Err(CoreError::InvalidImportId {
                id: id.to_string(),
                expected: if namespaced {
                    NAMESPACED_FORMAT
                } else {
                    CLUSTER_FORMAT
                },
            }),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_namespaced_import_id() {
        let r = ObjectRef::parse_import_id("monitoring/node-exporter", true).unwrap();
        assert_eq!(r.namespace.as_deref(), Some("monitoring"));
        assert_eq!(r.name, "node-exporter");
        assert_eq!(r.id(), "monitoring/node-exporter");
    }

    #[test]
    fn test_parse_cluster_import_id() {
        let r = ObjectRef::parse_import_id("global", false).unwrap();
        assert!(r.namespace.is_none());
        assert_eq!(r.to_string(), "global");
    }

    #[test]
    fn test_rejects_malformed_ids() {
        for id in ["", "name", "/name", "ns/", "a/b/c", "/"] {
            let err = ObjectRef::parse_import_id(id, true).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!(
                    "Expected import identifier with format: 'namespace/name'. Got: '{}'",
                    id
                )
            );
        }
    }

    #[test]
    fn test_cluster_scoped_rejects_slash() {
        assert!(ObjectRef::parse_import_id("ns/name", false).is_err());
        assert!(ObjectRef::parse_import_id("", false).is_err());
    }
}
