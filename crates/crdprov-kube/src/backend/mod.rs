//! Cluster access
//!
//! The lifecycle code only talks to a [`ClusterBackend`]. Two are provided:
//! - [`KubeBackend`]: the Kubernetes API through `kube`'s dynamic client
//! - [`MockBackend`]: an in-memory cluster used by tests

mod cluster;
mod mock;

pub use cluster::KubeBackend;
pub use mock::{MockBackend, OperationCounts};

use async_trait::async_trait;
use crdprov_core::{CrdKind, DeletionPropagation, ObjectRef};
use serde_json::Value as JsonValue;

use crate::error::Result;

/// Server-Side Apply parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOptions {
    pub field_manager: String,
    /// Take ownership of fields managed by others
    pub force: bool,
}

#[async_trait]
pub trait ClusterBackend: Send + Sync {
    /// Server-Side Apply `object` and return the object as stored
    async fn apply(
        &self,
        kind: &CrdKind,
        object: &JsonValue,
        options: &ApplyOptions,
    ) -> Result<JsonValue>;

    /// Fetch an object, `None` if it does not exist
    async fn get(&self, kind: &CrdKind, target: &ObjectRef) -> Result<Option<JsonValue>>;

    /// Delete an object
    ///
    /// Returns `false` if the object was already gone.
    async fn delete(
        &self,
        kind: &CrdKind,
        target: &ObjectRef,
        propagation: DeletionPropagation,
    ) -> Result<bool>;
}

/// Identity of a manifest built by [`crdprov_core::ResourceData::to_manifest`]
pub(crate) fn manifest_ref(object: &JsonValue) -> Option<ObjectRef> {
    let metadata = object.get("metadata")?;
    Some(ObjectRef {
        namespace: metadata
            .get("namespace")
            .and_then(JsonValue::as_str)
            .map(String::from),
        name: metadata.get("name")?.as_str()?.to_string(),
    })
}
