//! `ServiceMonitor` (monitoring.coreos.com/v1)

use super::CrdKind;
use super::common::{
    BYTE_SIZE, attach_metadata, fallback_scrape_protocol, label_selector, namespace_selector,
    native_histograms, scrape_class, scrape_endpoint_attributes, scrape_limits, scrape_protocols,
    tls_config,
};
use crate::schema::{Attribute, Validator};

pub static SERVICE_MONITOR: CrdKind = CrdKind {
    group: "monitoring.coreos.com",
    version: "v1",
    kind: "ServiceMonitor",
    plural: "servicemonitors",
    namespaced: true,
    description: "The ServiceMonitor custom resource definition (CRD) defines how Prometheus and PrometheusAgent can scrape metrics from a group of services.",
    spec,
};

fn endpoint() -> Attribute {
    let mut attrs = scrape_endpoint_attributes();
    attrs.push(Attribute::string("bearerTokenFile").describe("File to read bearer token for scraping the target. Deprecated: use 'authorization' instead."));
    attrs.push(Attribute::string("port").describe("Name of the Service port which this endpoint refers to."));
    attrs.push(tls_config("tlsConfig"));

    Attribute::list_nested("endpoints", attrs)
        .describe("List of endpoints part of this ServiceMonitor.")
}

fn spec() -> Attribute {
    let mut attrs = vec![
        attach_metadata(),
        Attribute::string("bodySizeLimit")
            .describe("When defined, bodySizeLimit specifies a job level limit on the size of uncompressed response body that will be accepted by Prometheus.")
            .validate(Validator::pattern(BYTE_SIZE)),
        endpoint(),
        fallback_scrape_protocol(),
        Attribute::string("jobLabel").describe("The label to use to retrieve the job name from."),
        namespace_selector(),
        Attribute::string_list("podTargetLabels")
            .describe("Labels which are transferred from the associated Kubernetes Pod object onto the ingested metrics."),
        scrape_class(),
        scrape_protocols(),
        label_selector("selector")
            .required()
            .describe("Label selector to select the Kubernetes Endpoints objects to scrape metrics from."),
        Attribute::string("selectorMechanism")
            .describe("Mechanism used to select the endpoints to scrape.")
            .validate(Validator::one_of(["RelabelConfig", "RoleSelector"])),
        Attribute::string_list("targetLabels")
            .describe("Labels which are transferred from the associated Kubernetes Service object onto the ingested metrics."),
    ];
    attrs.extend(scrape_limits());
    attrs.extend(native_histograms());

    Attribute::object("spec", attrs)
        .required()
        .describe("Specification of desired Service selection for target discovery by Prometheus.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::to_manifest_value;
    use crate::validate::SchemaValidator;
    use serde_json::json;

    #[test]
    fn test_valid_service_monitor() {
        let validator = SchemaValidator::new(SERVICE_MONITOR.resource_schema()).unwrap();
        let diags = validator.validate(&json!({
            "metadata": {"name": "api", "namespace": "monitoring"},
            "spec": {
                "endpoints": [{
                    "port": "metrics",
                    "interval": "30s",
                    "scheme": "https",
                    "tls_config": {"insecure_skip_verify": true, "ca_file": "/etc/ca.crt"},
                    "relabelings": [{"source_labels": ["__meta_kubernetes_pod_name"], "target_label": "pod"}]
                }],
                "namespace_selector": {"match_names": ["default"]},
                "selector": {"match_labels": {"app": "api"}}
            }
        }));
        assert!(diags.is_empty(), "{}", diags);
    }

    #[test]
    fn test_invalid_interval() {
        let validator = SchemaValidator::new(SERVICE_MONITOR.resource_schema()).unwrap();
        let diags = validator.validate(&json!({
            "metadata": {"name": "api", "namespace": "monitoring"},
            "spec": {
                "endpoints": [{"port": "metrics", "interval": "30"}],
                "selector": {}
            }
        }));
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags.iter().next().unwrap().attribute.as_deref(),
            Some("spec.endpoints[0].interval")
        );
    }

    #[test]
    fn test_spec_uses_crd_names() {
        let spec = SERVICE_MONITOR.spec_attribute();
        let manifest = to_manifest_value(
            &spec.attr_type,
            &json!({
                "endpoints": [{"bearer_token_file": "/token", "proxy_url": "http://proxy:3128"}],
                "pod_target_labels": ["team"],
                "selector": {}
            }),
        )
        .unwrap();
        assert_eq!(
            manifest,
            json!({
                "endpoints": [{"bearerTokenFile": "/token", "proxyUrl": "http://proxy:3128"}],
                "podTargetLabels": ["team"],
                "selector": {}
            })
        );
    }
}
