//! Provider dispatch
//!
//! Resolves type names through the registry and runs the matching resource,
//! data source or manifest operation. Failures are reported as
//! [`Diagnostics`].

use crdprov_core::schema::prune_nulls;
use crdprov_core::{
    CoreError, Diagnostics, ManifestRenderer, ProviderSchema, ResourceData, SchemaValidator,
    TypeEntry, TypeRole,
};
use serde_json::Value as JsonValue;
use tracing::{info, instrument};

use crate::backend::ClusterBackend;
use crate::config::ProviderConfig;
use crate::data_source::CrdDataSource;
use crate::error::{KubeError, Result};
use crate::plan::{PlanAction, PlanResult, plan};
use crate::resource::{CrdResource, prepare};

pub type OperationResult<T> = std::result::Result<T, Diagnostics>;

/// Outcome of an apply
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub action: PlanAction,
    pub state: JsonValue,
}

pub struct Provider<B> {
    backend: B,
    registry: &'static ProviderSchema,
    field_manager: String,
}

impl Provider<()> {
    /// Provider without a cluster; it can only validate, plan and render
    pub fn offline(config: &ProviderConfig) -> Self {
        Self::new((), config)
    }
}

impl<B> Provider<B> {
    pub fn new(backend: B, config: &ProviderConfig) -> Self {
        Self {
            backend,
            registry: ProviderSchema::global(),
            field_manager: config.field_manager().to_string(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn schema(&self) -> &ProviderSchema {
        self.registry
    }

    pub fn field_manager(&self) -> &str {
        &self.field_manager
    }

    fn entry(&self, type_name: &str, role: TypeRole) -> Result<&TypeEntry> {
        Ok(self.registry.resolve(type_name, role)?)
    }

    /// Validate a configuration without touching the cluster
    pub fn validate(&self, type_name: &str, role: TypeRole, config: &JsonValue) -> Diagnostics {
        let result = self.entry(type_name, role).and_then(|entry| match role {
            TypeRole::Resource => prepare(entry.kind, config).map(|_| ()),
            TypeRole::DataSource | TypeRole::Manifest => {
                let validator = SchemaValidator::new(entry.schema())?;
                let mut config = config.clone();
                prune_nulls(&mut config);
                let diags = validator.validate(&config);
                if diags.has_errors() {
                    return Err(CoreError::InvalidConfig(diags).into());
                }
                Ok(())
            }
        });

        match result {
            Ok(()) => Diagnostics::new(),
            Err(e) => e.into_diagnostics(),
        }
    }

    /// Plan a resource change
    pub fn plan(
        &self,
        type_name: &str,
        prior: Option<&JsonValue>,
        config: &JsonValue,
    ) -> OperationResult<PlanResult> {
        let run = || -> Result<PlanResult> {
            let entry = self.entry(type_name, TypeRole::Resource)?;
            let planned = prepare(entry.kind, config)?;
            let prior = prior.map(ResourceData::from_value).transpose()?;
            plan(entry.kind, prior.as_ref(), planned)
        };
        run().map_err(KubeError::into_diagnostics)
    }

    /// Render a manifest data source; never contacts the cluster
    pub fn render_manifest(&self, type_name: &str, config: &JsonValue) -> OperationResult<JsonValue> {
        let run = || -> Result<JsonValue> {
            let entry = self.entry(type_name, TypeRole::Manifest)?;
            let data = ManifestRenderer::new(entry.kind)?.render(config)?;
            Ok(data.to_value()?)
        };
        run().map_err(KubeError::into_diagnostics)
    }
}

impl<B: ClusterBackend> Provider<B> {
    fn resource(&self, type_name: &str) -> Result<CrdResource<'_, B>> {
        let entry = self.entry(type_name, TypeRole::Resource)?;
        Ok(CrdResource::new(entry.kind, &self.backend, &self.field_manager))
    }

    #[instrument(skip(self, config))]
    pub async fn create(&self, type_name: &str, config: &JsonValue) -> OperationResult<JsonValue> {
        let run = async {
            let resource = self.resource(type_name)?;
            let state = resource.create(resource.prepare(config)?).await?;
            info!(id = state.id.as_deref().unwrap_or_default(), "created");
            Ok::<_, KubeError>(state.to_value()?)
        };
        run.await.map_err(KubeError::into_diagnostics)
    }

    /// Refresh state; `None` means the object is gone
    #[instrument(skip(self, state))]
    pub async fn read(&self, type_name: &str, state: &JsonValue) -> OperationResult<Option<JsonValue>> {
        let run = async {
            let resource = self.resource(type_name)?;
            let refreshed = resource.read(ResourceData::from_value(state)?).await?;
            refreshed
                .map(|s| s.to_value().map_err(KubeError::from))
                .transpose()
        };
        run.await.map_err(KubeError::into_diagnostics)
    }

    #[instrument(skip(self, prior, config))]
    pub async fn update(
        &self,
        type_name: &str,
        prior: &JsonValue,
        config: &JsonValue,
    ) -> OperationResult<JsonValue> {
        let run = async {
            let resource = self.resource(type_name)?;
            let prior = ResourceData::from_value(prior)?;
            let state = resource.update(&prior, resource.prepare(config)?).await?;
            Ok::<_, KubeError>(state.to_value()?)
        };
        run.await.map_err(KubeError::into_diagnostics)
    }

    #[instrument(skip(self, state))]
    pub async fn delete(&self, type_name: &str, state: &JsonValue) -> OperationResult<()> {
        let run = async {
            let resource = self.resource(type_name)?;
            resource.delete(&ResourceData::from_value(state)?).await
        };
        run.await.map_err(KubeError::into_diagnostics)
    }

    #[instrument(skip(self))]
    pub async fn import(&self, type_name: &str, id: &str) -> OperationResult<JsonValue> {
        let run = async {
            let resource = self.resource(type_name)?;
            Ok::<_, KubeError>(resource.import(id).await?.to_value()?)
        };
        run.await.map_err(KubeError::into_diagnostics)
    }

    /// Plan and carry out whatever the plan calls for
    pub async fn apply(
        &self,
        type_name: &str,
        prior: Option<&JsonValue>,
        config: &JsonValue,
    ) -> OperationResult<ApplyOutcome> {
        let result = self.plan(type_name, prior, config)?;

        let state = match (result.action, prior) {
            (PlanAction::Create, _) | (_, None) => self.create(type_name, config).await?,
            (PlanAction::Update, Some(prior)) => self.update(type_name, prior, config).await?,
            (PlanAction::Replace, Some(prior)) => {
                self.delete(type_name, prior).await?;
                self.create(type_name, config).await?
            }
            (PlanAction::NoOp, Some(prior)) => prior.clone(),
        };

        Ok(ApplyOutcome {
            action: result.action,
            state,
        })
    }

    #[instrument(skip(self, config))]
    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: &JsonValue,
    ) -> OperationResult<JsonValue> {
        let run = async {
            let entry = self.entry(type_name, TypeRole::DataSource)?;
            let data = CrdDataSource::new(entry.kind, &self.backend)
                .read(config)
                .await?;
            Ok::<_, KubeError>(data.to_value()?)
        };
        run.await.map_err(KubeError::into_diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use serde_json::json;

    const SM: &str = "k8s_monitoring_coreos_com_service_monitor_v1";

    fn provider() -> Provider<MockBackend> {
        Provider::new(MockBackend::new(), &ProviderConfig::default())
    }

    fn config(port: &str) -> JsonValue {
        json!({
            "metadata": {"name": "api", "namespace": "monitoring"},
            "spec": {"endpoints": [{"port": port}], "selector": {"match_labels": {"app": "api"}}}
        })
    }

    #[test]
    fn test_validate_unknown_type() {
        let diags = provider().validate("ServiceMonitors2", TypeRole::Resource, &json!({}));
        assert!(diags.has_errors());
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.summary, "Unknown type");
        assert!(diag.detail.contains("did you mean"));
    }

    #[test]
    fn test_validate_manifest_config() {
        let p = Provider::offline(&ProviderConfig::default());
        let diags = p.validate(
            "ServiceMonitor",
            TypeRole::Manifest,
            &json!({"metadata": {"name": "api", "namespace": "monitoring"}, "spec": {"selector": {}}}),
        );
        assert!(diags.is_empty(), "{}", diags);

        let diags = p.validate("ServiceMonitor", TypeRole::Manifest, &json!({"metadata": {"name": "api"}}));
        assert!(diags.has_errors());
    }

    #[tokio::test]
    async fn test_bad_wait_pattern_is_rejected_before_apply() {
        let p = provider();
        let mut cfg = config("web");
        cfg["wait_for"] = json!({"fields": {"status.phase": "("}});

        let diags = p.validate(SM, TypeRole::Resource, &cfg);
        assert_eq!(diags.len(), 1);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.attribute.as_deref(), Some("wait_for.fields.status.phase"));

        assert!(p.plan(SM, None, &cfg).is_err());
        assert!(p.apply(SM, None, &cfg).await.is_err());
        assert!(p.backend().is_empty());
        assert_eq!(p.backend().operation_counts().applies, 0);
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let p = provider();

        let created = p.apply(SM, None, &config("web")).await.unwrap();
        assert_eq!(created.action, PlanAction::Create);
        assert_eq!(created.state["id"], "monitoring/api");

        let unchanged = p.apply(SM, Some(&created.state), &config("web")).await.unwrap();
        assert_eq!(unchanged.action, PlanAction::NoOp);
        assert_eq!(p.backend().operation_counts().applies, 1);

        let updated = p.apply(SM, Some(&created.state), &config("metrics")).await.unwrap();
        assert_eq!(updated.action, PlanAction::Update);
        assert_eq!(updated.state["spec"]["endpoints"][0]["port"], "metrics");

        let read = p.read(SM, &updated.state).await.unwrap().unwrap();
        assert_eq!(read["metadata"]["name"], "api");

        p.delete(SM, &read).await.unwrap();
        assert!(p.read(SM, &read).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_apply_replace_deletes_old_object() {
        let p = provider();
        let created = p.apply(SM, None, &config("web")).await.unwrap();

        let mut renamed = config("web");
        renamed["metadata"]["name"] = json!("api-v2");
        let replaced = p.apply(SM, Some(&created.state), &renamed).await.unwrap();

        assert_eq!(replaced.action, PlanAction::Replace);
        assert_eq!(replaced.state["id"], "monitoring/api-v2");
        assert_eq!(p.backend().len(), 1);
    }

    #[tokio::test]
    async fn test_import_and_data_source() {
        let p = provider();
        p.create(SM, &config("web")).await.unwrap();

        let imported = p.import("servicemonitors", "monitoring/api").await.unwrap();
        assert_eq!(imported["force_conflicts"], false);
        assert_eq!(imported["deletion_propagation"], "Background");

        let ds = p
            .read_data_source(SM, &json!({"metadata": {"name": "api", "namespace": "monitoring"}}))
            .await
            .unwrap();
        assert_eq!(ds["spec"]["endpoints"][0]["port"], "web");
        assert!(ds.get("force_conflicts").is_none());
    }

    #[tokio::test]
    async fn test_errors_become_diagnostics() {
        let p = provider();
        let diags = p.import(SM, "not-an-id").await.unwrap_err();
        assert_eq!(
            diags.iter().next().unwrap().detail,
            "Expected import identifier with format: 'namespace/name'. Got: 'not-an-id'"
        );

        let diags = p
            .read_data_source(SM, &json!({"metadata": {"name": "nope", "namespace": "monitoring"}}))
            .await
            .unwrap_err();
        assert_eq!(diags.iter().next().unwrap().summary, "Object not found");
    }

    #[test]
    fn test_render_manifest_offline() {
        let p = Provider::offline(&ProviderConfig::default());
        let state = p
            .render_manifest(&format!("{}_manifest", SM), &config("web"))
            .unwrap();
        assert_eq!(state["id"], "monitoring/api");
        let yaml = state["yaml"].as_str().unwrap();
        assert!(yaml.contains("kind: ServiceMonitor"));
        assert!(!yaml.contains("force_conflicts"));
    }

    #[test]
    fn test_field_manager_from_config() {
        let config = ProviderConfig {
            field_manager: Some("platform".into()),
            ..Default::default()
        };
        let p = Provider::new(MockBackend::new(), &config);
        assert_eq!(p.field_manager(), "platform");
    }
}
