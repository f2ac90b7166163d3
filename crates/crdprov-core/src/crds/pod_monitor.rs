//! `PodMonitor` (monitoring.coreos.com/v1)

use super::CrdKind;
use super::common::{
    BYTE_SIZE, attach_metadata, fallback_scrape_protocol, label_selector, namespace_selector,
    native_histograms, safe_tls_config, scrape_class, scrape_endpoint_attributes, scrape_limits,
    scrape_protocols,
};
use crate::schema::{Attribute, Validator};

pub static POD_MONITOR: CrdKind = CrdKind {
    group: "monitoring.coreos.com",
    version: "v1",
    kind: "PodMonitor",
    plural: "podmonitors",
    namespaced: true,
    description: "The PodMonitor custom resource definition (CRD) defines how Prometheus and PrometheusAgent can scrape metrics from a group of pods.",
    spec,
};

fn pod_metrics_endpoint() -> Attribute {
    let mut attrs = scrape_endpoint_attributes();
    attrs.push(Attribute::string("port").describe("The Pod port name which exposes the endpoint."));
    attrs.push(
        Attribute::int64("portNumber")
            .describe("The Pod port number which exposes the endpoint.")
            .validate(Validator::between(1, 65535)),
    );
    attrs.push(safe_tls_config("tlsConfig"));

    Attribute::list_nested("podMetricsEndpoints", attrs)
        .describe("Defines how to scrape metrics from the selected pods.")
}

fn spec() -> Attribute {
    let mut attrs = vec![
        attach_metadata(),
        Attribute::string("bodySizeLimit").validate(Validator::pattern(BYTE_SIZE)),
        fallback_scrape_protocol(),
        Attribute::string("jobLabel")
            .describe("The label to use to retrieve the job name from."),
        namespace_selector(),
        pod_metrics_endpoint(),
        Attribute::string_list("podTargetLabels"),
        scrape_class(),
        scrape_protocols(),
        label_selector("selector")
            .required()
            .describe("Label selector to select the Kubernetes Pod objects to scrape metrics from."),
        Attribute::string("selectorMechanism")
            .validate(Validator::one_of(["RelabelConfig", "RoleSelector"])),
    ];
    attrs.extend(scrape_limits());
    attrs.extend(native_histograms());

    Attribute::object("spec", attrs)
        .required()
        .describe("Specification of desired Pod selection for target discovery by Prometheus.")
}
