//! Per-operation data records
//!
//! These are transient DTOs: built from plan/state at the start of an
//! operation and written back into state at the end. Bookkeeping fields
//! (`force_conflicts`, `field_manager`, `wait_for`, ...) only live on the
//! provider side and never reach the cluster.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::crds::CrdKind;
use crate::error::{CoreError, Result};
use crate::identity::ObjectRef;
use crate::schema::{from_manifest_value, to_manifest_value};

/// Field manager used when neither the configuration nor the provider sets one
pub const DEFAULT_FIELD_MANAGER: &str = "crdprov";

/// Object metadata managed by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Metadata {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }

    fn to_manifest_json(&self) -> JsonValue {
        let mut meta = Map::new();
        meta.insert("name".into(), JsonValue::String(self.name.clone()));
        if let Some(ns) = &self.namespace {
            meta.insert("namespace".into(), JsonValue::String(ns.clone()));
        }
        if !self.labels.is_empty() {
            meta.insert("labels".into(), string_map(&self.labels));
        }
        if !self.annotations.is_empty() {
            meta.insert("annotations".into(), string_map(&self.annotations));
        }
        JsonValue::Object(meta)
    }
}

fn string_map(map: &BTreeMap<String, String>) -> JsonValue {
    JsonValue::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect(),
    )
}

/// Propagation policy used when deleting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionPropagation {
    Orphan,
    #[default]
    Background,
    Foreground,
}

impl DeletionPropagation {
    pub const ALL: [&'static str; 3] = ["Orphan", "Background", "Foreground"];
}

/// Match on an entry of `status.conditions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionMatch {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
}

/// Poll the object after apply until it reports the expected state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitFor {
    /// Field path (Kubernetes JSON names) to regex
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ConditionMatch>,

    #[serde(default = "default_wait_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for WaitFor {
    fn default() -> Self {
        Self {
            fields: BTreeMap::new(),
            conditions: Vec::new(),
            timeout: default_wait_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

/// Poll after delete until the object is gone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitForDelete {
    #[serde(default = "default_wait_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for WaitForDelete {
    fn default() -> Self {
        Self {
            timeout: default_wait_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_wait_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

/// State of a managed resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    pub metadata: Metadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<JsonValue>,

    #[serde(default)]
    pub force_conflicts: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_manager: Option<String>,

    #[serde(default)]
    pub deletion_propagation: DeletionPropagation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for: Option<WaitFor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_delete: Option<WaitForDelete>,
}

impl ResourceData {
    /// Build from a validated configuration or a stored state document
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn to_value(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn object_ref(&self) -> ObjectRef {
        self.metadata.object_ref()
    }

    /// The object submitted to the cluster
    pub fn to_manifest(&self, kind: &CrdKind) -> JsonValue {
        build_manifest(kind, &self.metadata, self.spec.as_ref())
    }

    /// Overwrite the cluster-owned parts of the state with a live object
    ///
    /// Bookkeeping fields are kept as planned.
    pub fn sync_from(&mut self, kind: &CrdKind, object: &JsonValue) -> Result<()> {
        let (metadata, spec) = read_object(kind, object)?;
        self.id = Some(metadata.object_ref().id());
        self.api_version = Some(kind.api_version());
        self.kind = Some(kind.kind.to_string());
        self.metadata = metadata;
        self.spec = spec;
        Ok(())
    }

    /// State for an object adopted through import
    pub fn imported(kind: &CrdKind, object: &JsonValue) -> Result<Self> {
        let mut data = Self::default();
        data.sync_from(kind, object)?;
        Ok(data)
    }
}

/// State of a live data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    pub metadata: Metadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<JsonValue>,
}

impl DataSourceData {
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn to_value(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn object_ref(&self) -> ObjectRef {
        self.metadata.object_ref()
    }

    pub fn from_object(kind: &CrdKind, object: &JsonValue) -> Result<Self> {
        let (metadata, spec) = read_object(kind, object)?;
        Ok(Self {
            id: Some(metadata.object_ref().id()),
            api_version: Some(kind.api_version()),
            kind: Some(kind.kind.to_string()),
            metadata,
            spec,
        })
    }
}

/// State of a manifest data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub metadata: Metadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<JsonValue>,

    /// Rendered manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaml: Option<String>,
}

impl ManifestData {
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn to_value(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_manifest(&self, kind: &CrdKind) -> JsonValue {
        build_manifest(kind, &self.metadata, self.spec.as_ref())
    }
}

/// Assemble the Kubernetes object for a kind
pub fn build_manifest(kind: &CrdKind, metadata: &Metadata, spec: Option<&JsonValue>) -> JsonValue {
    let mut obj = Map::new();
    obj.insert("apiVersion".into(), JsonValue::String(kind.api_version()));
    obj.insert("kind".into(), JsonValue::String(kind.kind.to_string()));
    obj.insert("metadata".into(), metadata.to_manifest_json());

    let spec_attr = kind.spec_attribute();
    if let Some(spec) = spec.and_then(|s| to_manifest_value(&spec_attr.attr_type, s)) {
        obj.insert("spec".into(), spec);
    }

    JsonValue::Object(obj)
}

fn read_object(kind: &CrdKind, object: &JsonValue) -> Result<(Metadata, Option<JsonValue>)> {
    let meta = object
        .get("metadata")
        .ok_or(CoreError::MalformedObject { field: "metadata" })?;
    let metadata: Metadata = serde_json::from_value(meta.clone())?;

    let spec_attr = kind.spec_attribute();
    let spec = object
        .get("spec")
        .and_then(|s| from_manifest_value(&spec_attr.attr_type, s));

    Ok((metadata, spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crds::service_monitor::SERVICE_MONITOR;
    use serde_json::json;

    fn config() -> JsonValue {
        json!({
            "metadata": {
                "name": "api",
                "namespace": "monitoring",
                "labels": {"team": "sre"}
            },
            "spec": {
                "endpoints": [{"port": "metrics", "interval": "30s"}],
                "selector": {"match_labels": {"app": "api"}}
            },
            "force_conflicts": true,
            "field_manager": "ci",
            "wait_for_delete": {"timeout": "1m"}
        })
    }

    #[test]
    fn test_from_value_applies_serde_defaults() {
        let data = ResourceData::from_value(&config()).unwrap();
        assert!(data.force_conflicts);
        assert_eq!(data.deletion_propagation, DeletionPropagation::Background);
        let wfd = data.wait_for_delete.unwrap();
        assert_eq!(wfd.timeout, Duration::from_secs(60));
        assert_eq!(wfd.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_manifest_excludes_bookkeeping() {
        let data = ResourceData::from_value(&config()).unwrap();
        let manifest = data.to_manifest(&SERVICE_MONITOR);

        assert_eq!(manifest["apiVersion"], "monitoring.coreos.com/v1");
        assert_eq!(manifest["kind"], "ServiceMonitor");
        assert_eq!(manifest["metadata"]["labels"]["team"], "sre");
        assert_eq!(manifest["spec"]["selector"]["matchLabels"]["app"], "api");
        assert!(manifest.get("force_conflicts").is_none());
        assert!(manifest.get("field_manager").is_none());
        assert!(manifest.get("wait_for_delete").is_none());
    }

    #[test]
    fn test_sync_from_keeps_bookkeeping() {
        let mut data = ResourceData::from_value(&config()).unwrap();
        let live = json!({
            "apiVersion": "monitoring.coreos.com/v1",
            "kind": "ServiceMonitor",
            "metadata": {
                "name": "api",
                "namespace": "monitoring",
                "uid": "0c6f2b1e",
                "resourceVersion": "42",
                "labels": {"team": "sre"}
            },
            "spec": {
                "endpoints": [{"port": "metrics", "interval": "30s"}],
                "selector": {"matchLabels": {"app": "api"}}
            },
            "status": {"conditions": []}
        });

        data.sync_from(&SERVICE_MONITOR, &live).unwrap();

        assert_eq!(data.id.as_deref(), Some("monitoring/api"));
        assert_eq!(data.kind.as_deref(), Some("ServiceMonitor"));
        assert_eq!(data.field_manager.as_deref(), Some("ci"));
        assert!(data.force_conflicts);
        assert_eq!(
            data.spec,
            Some(json!({
                "endpoints": [{"port": "metrics", "interval": "30s"}],
                "selector": {"match_labels": {"app": "api"}}
            }))
        );
    }

    #[test]
    fn test_imported_uses_default_bookkeeping() {
        let live = json!({
            "metadata": {"name": "api", "namespace": "monitoring"},
            "spec": {"selector": {}}
        });
        let data = ResourceData::imported(&SERVICE_MONITOR, &live).unwrap();
        assert_eq!(data.id.as_deref(), Some("monitoring/api"));
        assert!(!data.force_conflicts);
        assert!(data.field_manager.is_none());
        assert!(data.wait_for.is_none());
    }

    #[test]
    fn test_read_object_requires_metadata() {
        let err = DataSourceData::from_object(&SERVICE_MONITOR, &json!({"spec": {}})).unwrap_err();
        assert!(err.to_string().contains("metadata"));
    }

    #[test]
    fn test_wait_for_round_trips_durations() {
        let wait: WaitFor = serde_json::from_value(json!({
            "conditions": [{"type": "Available", "status": "True"}],
            "poll_interval": "500ms"
        }))
        .unwrap();
        assert_eq!(wait.timeout, Duration::from_secs(30));
        assert_eq!(wait.poll_interval, Duration::from_millis(500));

        let value = serde_json::to_value(&wait).unwrap();
        assert_eq!(value["timeout"], "30s");
        assert_eq!(value["conditions"][0]["type"], "Available");
    }
}
