//! Manifest data source
//!
//! Renders a configured object to YAML without talking to a cluster.

use serde_json::Value as JsonValue;

use crate::crds::CrdKind;
use crate::error::{CoreError, Result};
use crate::model::ManifestData;
use crate::schema::prune_nulls;
use crate::validate::SchemaValidator;

/// Renders manifests for one kind
pub struct ManifestRenderer {
    kind: &'static CrdKind,
    validator: SchemaValidator,
}

impl ManifestRenderer {
    pub fn new(kind: &'static CrdKind) -> Result<Self> {
        Ok(Self {
            kind,
            validator: SchemaValidator::new(kind.manifest_schema())?,
        })
    }

    pub fn kind(&self) -> &'static CrdKind {
        self.kind
    }

    /// Validate `config` and fill in the computed `id` and `yaml`
    pub fn render(&self, config: &JsonValue) -> Result<ManifestData> {
        let mut config = config.clone();
        prune_nulls(&mut config);

        let diags = self.validator.validate(&config);
        if diags.has_errors() {
            return Err(CoreError::InvalidConfig(diags));
        }
        self.validator.schema().apply_defaults(&mut config);

        let mut data = ManifestData::from_value(&config)?;
        data.id = Some(data.metadata.object_ref().id());
        data.yaml = Some(to_yaml(&data.to_manifest(self.kind))?);

        Ok(data)
    }
}

/// Serialize a Kubernetes object as a YAML document
pub fn to_yaml(object: &JsonValue) -> Result<String> {
    Ok(serde_yaml::to_string(object)?)
}
