//! Prometheus Operator CRD definitions
//!
//! Each kind is a static [`CrdKind`] whose `spec` constructor builds the
//! attribute tree mirroring the CRD's OpenAPI schema. Everything outside
//! `spec` (identity, metadata, bookkeeping) is shared and lives here.

pub mod common;
pub mod pod_monitor;
pub mod probe;
pub mod prometheus_rule;
pub mod service_monitor;

use crate::model::DeletionPropagation;
use crate::schema::{Attribute, Schema, Validator, snake_case};

pub use pod_monitor::POD_MONITOR;
pub use probe::PROBE;
pub use prometheus_rule::PROMETHEUS_RULE;
pub use service_monitor::SERVICE_MONITOR;

/// DNS-1123 subdomain
const DNS_SUBDOMAIN: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$";

/// DNS-1123 label
const DNS_LABEL: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";

/// Qualified name with optional DNS subdomain prefix (label and annotation keys)
const QUALIFIED_NAME: &str = r"^([a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*/)?[A-Za-z0-9]([-A-Za-z0-9_.]{0,61}[A-Za-z0-9])?$";

const LABEL_VALUE: &str = r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$";

/// Durations accepted by `wait_for` and `wait_for_delete`
const WAIT_DURATION: &str = r"^([0-9]+(ms|s|m|h))+$";

/// A [`WAIT_DURATION`] with at least one non-zero component
const POLL_INTERVAL: &str = r"^([0-9]+(ms|s|m|h))*[0-9]*[1-9][0-9]*(ms|s|m|h)([0-9]+(ms|s|m|h))*$";

/// A custom resource kind exposed by the provider
#[derive(Debug)]
pub struct CrdKind {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
    pub namespaced: bool,
    pub description: &'static str,

    /// Builds the `spec` attribute
    pub spec: fn() -> Attribute,
}

impl CrdKind {
    pub fn api_version(&self) -> String {
        format!("{}/{}", self.group, self.version)
    }

    /// Resource and data source type name, e.g.
    /// `k8s_monitoring_coreos_com_service_monitor_v1`
    pub fn type_name(&self) -> String {
        format!(
            "k8s_{}_{}_{}",
            self.group.replace('.', "_"),
            snake_case(self.kind),
            self.version
        )
    }

    pub fn manifest_type_name(&self) -> String {
        format!("{}_manifest", self.type_name())
    }

    pub fn spec_attribute(&self) -> Attribute {
        (self.spec)()
    }

    /// Schema of the managed resource
    pub fn resource_schema(&self) -> Schema {
        let mut attrs = self.identity_attributes();
        attrs.push(self.metadata_attribute(true));
        attrs.push(self.spec_attribute());
        attrs.extend(bookkeeping_attributes());

        Schema::new(
            format!("{} {}", self.description, RESOURCE_NOTE),
            attrs,
        )
    }

    /// Schema of the data source reading a live object
    pub fn data_source_schema(&self) -> Schema {
        let mut attrs = self.identity_attributes();
        attrs.push(self.metadata_attribute(true));
        attrs.push(self.spec_attribute());

        Schema::new("", attrs).for_data_source(self.description)
    }

    /// Schema of the manifest data source
    pub fn manifest_schema(&self) -> Schema {
        Schema::new(
            format!("{} {}", self.description, MANIFEST_NOTE),
            [
                Attribute::string("id")
                    .computed()
                    .describe("The identifier of this manifest, 'namespace/name'."),
                self.metadata_attribute(false),
                self.spec_attribute(),
                Attribute::string("yaml")
                    .computed()
                    .describe("The generated manifest in YAML format."),
            ],
        )
    }

    fn identity_attributes(&self) -> Vec<Attribute> {
        vec![
            Attribute::string("id")
                .computed()
                .describe("The unique identifier of this object, 'namespace/name'."),
            Attribute::string("apiVersion")
                .computed()
                .describe("The API group and version of the object."),
            Attribute::string("kind")
                .computed()
                .describe("The Kubernetes kind of the object."),
        ]
    }

    /// `metadata` block; with `live`, labels and annotations are also
    /// refreshed from the object in the cluster
    fn metadata_attribute(&self, live: bool) -> Attribute {
        let presence = |attr: Attribute| if live { attr.optional_computed() } else { attr };

        let namespace = Attribute::string("namespace")
            .describe("The namespace of the object, a DNS-1123 label.")
            .validate(Validator::length(Some(1), Some(63)))
            .validate(Validator::pattern(DNS_LABEL));

        let mut attrs = vec![
            Attribute::string("name")
                .required()
                .describe("The name of the object, a DNS-1123 subdomain.")
                .validate(Validator::length(Some(1), Some(253)))
                .validate(Validator::pattern(DNS_SUBDOMAIN)),
        ];
        if self.namespaced {
            attrs.push(namespace.required());
        }
        attrs.push(presence(
            Attribute::string_map("labels")
                .describe("Map of string keys and values used to organize and select objects.")
                .validate(Validator::keys(Validator::pattern(QUALIFIED_NAME)))
                .validate(Validator::values(Validator::length(None, Some(63))))
                .validate(Validator::values(Validator::pattern(LABEL_VALUE))),
        ));
        attrs.push(presence(
            Attribute::string_map("annotations")
                .describe("Unstructured key value map stored with the object.")
                .validate(Validator::keys(Validator::pattern(QUALIFIED_NAME))),
        ));

        Attribute::object("metadata", attrs)
            .required()
            .describe("Data that helps uniquely identify this object.")
    }
}

const RESOURCE_NOTE: &str = "Changes are submitted with Server-Side Apply.";
const MANIFEST_NOTE: &str = "Renders the object as YAML without contacting a cluster.";

/// Provider-side attributes that never reach the cluster
fn bookkeeping_attributes() -> Vec<Attribute> {
    let duration = |name: &str, default: &str| {
        Attribute::string(name)
            .default_value(default)
            .validate(Validator::pattern(WAIT_DURATION))
    };
    let poll_interval = || {
        Attribute::string("poll_interval")
            .default_value("5s")
            .describe("Time between two checks. Must be greater than zero.")
            .validate(Validator::pattern(POLL_INTERVAL))
    };

    vec![
        Attribute::bool("force_conflicts")
            .default_value(false)
            .describe("Take ownership of fields managed by other field managers."),
        Attribute::string("field_manager")
            .describe("The field manager used for Server-Side Apply. Defaults to the provider's field manager.")
            .validate(Validator::length(Some(1), Some(128))),
        Attribute::string("deletion_propagation")
            .default_value("Background")
            .describe("How dependents are handled when the object is deleted.")
            .validate(Validator::one_of(DeletionPropagation::ALL)),
        Attribute::object(
            "wait_for",
            [
                Attribute::string_map("fields")
                    .describe("Field paths mapped to regular expressions the values must match."),
                Attribute::list_nested(
                    "conditions",
                    [
                        Attribute::string("type").required(),
                        Attribute::string("status").required(),
                    ],
                )
                .describe("Status conditions that must be present."),
                duration("timeout", "30s"),
                poll_interval(),
            ],
        )
        .describe("Wait after apply until the object reports the expected state."),
        Attribute::object(
            "wait_for_delete",
            [duration("timeout", "30s"), poll_interval()],
        )
        .describe("Wait after delete until the object is gone."),
    ]
}

/// Every kind exposed by the provider
pub fn all() -> [&'static CrdKind; 4] {
    [&POD_MONITOR, &PROBE, &PROMETHEUS_RULE, &SERVICE_MONITOR]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Presence;
    use crate::validate::SchemaValidator;
    use serde_json::json;

    #[test]
    fn test_type_names() {
        assert_eq!(
            SERVICE_MONITOR.type_name(),
            "k8s_monitoring_coreos_com_service_monitor_v1"
        );
        assert_eq!(
            PROMETHEUS_RULE.manifest_type_name(),
            "k8s_monitoring_coreos_com_prometheus_rule_v1_manifest"
        );
        assert_eq!(POD_MONITOR.api_version(), "monitoring.coreos.com/v1");
    }

    #[test]
    fn test_every_schema_compiles() {
        for kind in all() {
            for schema in [
                kind.resource_schema(),
                kind.data_source_schema(),
                kind.manifest_schema(),
            ] {
                assert!(
                    SchemaValidator::new(schema).is_ok(),
                    "{} schema failed to compile",
                    kind.kind
                );
            }
        }
    }

    #[test]
    fn test_resource_schema_layout() {
        let schema = SERVICE_MONITOR.resource_schema();
        let names: Vec<&str> = schema.attributes.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            [
                "id",
                "api_version",
                "kind",
                "metadata",
                "spec",
                "force_conflicts",
                "field_manager",
                "deletion_propagation",
                "wait_for",
                "wait_for_delete"
            ]
        );
        assert_eq!(schema.attributes["id"].presence, Presence::Computed);

        let metadata = schema.attributes["metadata"].attr_type.nested().unwrap();
        assert_eq!(metadata["name"].presence, Presence::Required);
        assert_eq!(metadata["labels"].presence, Presence::OptionalComputed);

        let manifest = SERVICE_MONITOR.manifest_schema();
        let metadata = manifest.attributes["metadata"].attr_type.nested().unwrap();
        assert_eq!(metadata["labels"].presence, Presence::Optional);
        assert!(manifest.to_json_schema()["properties"]["metadata"]["properties"]
            .get("labels")
            .is_some());
    }

    #[test]
    fn test_data_source_schema_has_no_bookkeeping() {
        let schema = PROBE.data_source_schema();
        assert!(schema.attribute("force_conflicts").is_none());
        assert_eq!(schema.attributes["spec"].presence, Presence::Computed);
    }

    #[test]
    fn test_metadata_validation() {
        let validator = SchemaValidator::new(POD_MONITOR.manifest_schema()).unwrap();
        let base = |metadata| {
            json!({
                "metadata": metadata,
                "spec": {"selector": {}}
            })
        };

        assert!(
            validator
                .validate(&base(json!({"name": "web", "namespace": "monitoring"})))
                .is_empty()
        );

        for bad in [
            json!({"name": "Web", "namespace": "monitoring"}),
            json!({"name": "web", "namespace": "a.b"}),
            json!({"name": "web", "namespace": ""}),
            json!({"name": "web", "namespace": "monitoring", "labels": {"-bad": "x"}}),
            json!({"name": "web", "namespace": "monitoring", "labels": {"team": "not valid"}}),
        ] {
            assert!(
                validator.validate(&base(bad.clone())).has_errors(),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_bookkeeping_defaults() {
        let mut config = json!({"wait_for": {"conditions": []}});
        SERVICE_MONITOR.resource_schema().apply_defaults(&mut config);
        assert_eq!(config["force_conflicts"], false);
        assert_eq!(config["deletion_propagation"], "Background");
        assert_eq!(config["wait_for"]["timeout"], "30s");
        assert!(config.get("field_manager").is_none());
        assert!(config.get("wait_for_delete").is_none());
    }

    #[test]
    fn test_poll_interval_must_be_positive() {
        let validator = SchemaValidator::new(PROBE.resource_schema()).unwrap();
        let config = |block: &str, interval: &str| {
            json!({
                "metadata": {"name": "blackbox", "namespace": "monitoring"},
                "spec": {"prober": {"url": "exporter:9115"}},
                block: {"timeout": "0s", "poll_interval": interval}
            })
        };

        for block in ["wait_for", "wait_for_delete"] {
            for good in ["5s", "500ms", "0s1ms", "1m30s", "10m"] {
                let diags = validator.validate(&config(block, good));
                assert!(diags.is_empty(), "{}.poll_interval {} rejected: {}", block, good, diags);
            }
            let path = format!("{}.poll_interval", block);
            for bad in ["0s", "00ms", "0m0s", "5", ""] {
                let diags = validator.validate(&config(block, bad));
                assert!(
                    diags.iter().any(|d| d.attribute.as_ref() == Some(&path)),
                    "{}.poll_interval {} accepted",
                    block,
                    bad
                );
            }
        }
    }
}
