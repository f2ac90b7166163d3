//! Managed resource lifecycle
//!
//! Create and update are the same Server-Side Apply request; the object as
//! returned by the API server (after an optional `wait_for`) is written back
//! into state with the planned bookkeeping fields.

use crdprov_core::schema::prune_nulls;
use crdprov_core::{CoreError, CrdKind, ObjectRef, ResourceData, SchemaValidator, WaitMatcher};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::backend::{ApplyOptions, ClusterBackend};
use crate::error::{KubeError, Result};
use crate::wait::{wait_for_deletion, wait_for_ready};

/// Validate a resource configuration and fill defaults and computed fields
pub fn prepare(kind: &CrdKind, config: &JsonValue) -> Result<ResourceData> {
    let validator = SchemaValidator::new(kind.resource_schema())?;

    let mut config = config.clone();
    prune_nulls(&mut config);
    let diags = validator.validate(&config);
    if diags.has_errors() {
        return Err(CoreError::InvalidConfig(diags).into());
    }
    validator.schema().apply_defaults(&mut config);

    let mut data = ResourceData::from_value(&config)?;
    if let Some(wait) = &data.wait_for {
        let diags = WaitMatcher::check(wait);
        if diags.has_errors() {
            return Err(CoreError::InvalidConfig(diags).into());
        }
    }
    data.id = Some(data.object_ref().id());
    data.api_version = Some(kind.api_version());
    data.kind = Some(kind.kind.to_string());
    Ok(data)
}

/// Resource operations for one kind
pub struct CrdResource<'a, B: ?Sized> {
    kind: &'static CrdKind,
    backend: &'a B,
    default_field_manager: &'a str,
}

impl<'a, B> CrdResource<'a, B>
where
    B: ClusterBackend + ?Sized,
{
    pub fn new(kind: &'static CrdKind, backend: &'a B, default_field_manager: &'a str) -> Self {
        Self {
            kind,
            backend,
            default_field_manager,
        }
    }

    pub fn kind(&self) -> &'static CrdKind {
        self.kind
    }

    /// Validate a configuration document and turn it into planned state
    pub fn prepare(&self, config: &JsonValue) -> Result<ResourceData> {
        prepare(self.kind, config)
    }

    pub async fn create(&self, planned: ResourceData) -> Result<ResourceData> {
        self.apply(planned).await
    }

    /// Apply changes to an existing object
    ///
    /// Name and namespace are fixed for the lifetime of the object.
    pub async fn update(&self, prior: &ResourceData, planned: ResourceData) -> Result<ResourceData> {
        let from = prior.object_ref();
        let to = planned.object_ref();
        if from != to {
            return Err(KubeError::RequiresReplacement {
                kind: self.kind.kind.to_string(),
                from: from.id(),
                to: to.id(),
            });
        }
        self.apply(planned).await
    }

    /// Refresh state from the cluster
    ///
    /// Returns `None` when the object no longer exists.
    pub async fn read(&self, mut state: ResourceData) -> Result<Option<ResourceData>> {
        let target = state.object_ref();
        match self.backend.get(self.kind, &target).await? {
            Some(live) => {
                state.sync_from(self.kind, &live)?;
                Ok(Some(state))
            }
            None => {
                warn!(kind = self.kind.kind, id = %target, "object is gone, removing from state");
                Ok(None)
            }
        }
    }

    pub async fn delete(&self, state: &ResourceData) -> Result<()> {
        let target = state.object_ref();
        let deleted = self
            .backend
            .delete(self.kind, &target, state.deletion_propagation)
            .await?;

        if !deleted {
            debug!(kind = self.kind.kind, id = %target, "already deleted");
            return Ok(());
        }

        if let Some(wait) = &state.wait_for_delete {
            wait_for_deletion(self.backend, self.kind, &target, wait).await?;
        }

        info!(kind = self.kind.kind, id = %target, "deleted");
        Ok(())
    }

    /// Adopt an existing object
    pub async fn import(&self, id: &str) -> Result<ResourceData> {
        let target = ObjectRef::parse_import_id(id, self.kind.namespaced)?;
        let live = self
            .backend
            .get(self.kind, &target)
            .await?
            .ok_or_else(|| KubeError::NotFound {
                kind: self.kind.kind.to_string(),
                id: target.id(),
            })?;

        info!(kind = self.kind.kind, id = %target, "imported");
        Ok(ResourceData::imported(self.kind, &live)?)
    }

    async fn apply(&self, mut planned: ResourceData) -> Result<ResourceData> {
        let target = planned.object_ref();
        let options = ApplyOptions {
            field_manager: planned
                .field_manager
                .clone()
                .unwrap_or_else(|| self.default_field_manager.to_string()),
            force: planned.force_conflicts,
        };

        let manifest = planned.to_manifest(self.kind);
        let mut live = self.backend.apply(self.kind, &manifest, &options).await?;

        if let Some(wait) = &planned.wait_for {
            live = wait_for_ready(self.backend, self.kind, &target, wait).await?;
        }

        planned.sync_from(self.kind, &live)?;
        Ok(planned)
    }
}
