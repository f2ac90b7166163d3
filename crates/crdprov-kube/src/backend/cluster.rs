//! Kubernetes API backend

use async_trait::async_trait;
use crdprov_core::{CrdKind, DeletionPropagation, ObjectRef};
use kube::{
    Client,
    api::{Api, DeleteParams, DynamicObject, Patch, PatchParams, PropagationPolicy},
    core::GroupVersionKind,
    discovery::ApiResource,
};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use super::{ApplyOptions, ClusterBackend, manifest_ref};
use crate::error::{KubeError, Result};

/// Backend using the dynamic `kube` client
#[derive(Clone)]
pub struct KubeBackend {
    client: Client,
}

impl KubeBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create an Api client for a kind, scoped to the object's namespace
    fn api(&self, kind: &CrdKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let gvk = GroupVersionKind::gvk(kind.group, kind.version, kind.kind);
        let api_resource = ApiResource::from_gvk_with_plural(&gvk, kind.plural);

        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &api_resource),
            None => Api::all_with(self.client.clone(), &api_resource),
        }
    }
}

fn propagation_policy(propagation: DeletionPropagation) -> PropagationPolicy {
    match propagation {
        DeletionPropagation::Orphan => PropagationPolicy::Orphan,
        DeletionPropagation::Background => PropagationPolicy::Background,
        DeletionPropagation::Foreground => PropagationPolicy::Foreground,
    }
}

#[async_trait]
impl ClusterBackend for KubeBackend {
    async fn apply(
        &self,
        kind: &CrdKind,
        object: &JsonValue,
        options: &ApplyOptions,
    ) -> Result<JsonValue> {
        let target = manifest_ref(object).ok_or_else(|| {
            KubeError::InvalidConfig(format!("{} manifest missing metadata.name", kind.kind))
        })?;
        let api = self.api(kind, target.namespace.as_deref());

        let mut params = PatchParams::apply(&options.field_manager);
        if options.force {
            params = params.force();
        }

        info!(
            kind = kind.kind,
            id = %target,
            field_manager = %options.field_manager,
            force = options.force,
            "server-side apply"
        );

        let applied = api
            .patch(&target.name, &params, &Patch::Apply(object))
            .await
            .map_err(|e| match e {
                kube::Error::Api(resp) if resp.code == 409 => KubeError::Conflict {
                    kind: kind.kind.to_string(),
                    id: target.id(),
                    message: resp.message,
                },
                other => KubeError::Api(other),
            })?;

        Ok(serde_json::to_value(applied)?)
    }

    async fn get(&self, kind: &CrdKind, target: &ObjectRef) -> Result<Option<JsonValue>> {
        debug!(kind = kind.kind, id = %target, "get");

        let api = self.api(kind, target.namespace.as_deref());
        match api.get_opt(&target.name).await? {
            Some(obj) => Ok(Some(serde_json::to_value(obj)?)),
            None => Ok(None),
        }
    }

    async fn delete(
        &self,
        kind: &CrdKind,
        target: &ObjectRef,
        propagation: DeletionPropagation,
    ) -> Result<bool> {
        let api = self.api(kind, target.namespace.as_deref());

        let params = DeleteParams {
            propagation_policy: Some(propagation_policy(propagation)),
            ..Default::default()
        };

        info!(kind = kind.kind, id = %target, ?propagation, "delete");

        match api.delete(&target.name, &params).await {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(resp)) if resp.code == 404 => {
                debug!(kind = kind.kind, id = %target, "already deleted");
                Ok(false)
            }
            Err(e) => Err(KubeError::Api(e)),
        }
    }
}
