//! `Probe` (monitoring.coreos.com/v1)

use super::CrdKind;
use super::common::{
    authorization, basic_auth, duration, fallback_scrape_protocol, label_selector,
    namespace_selector, native_histograms, oauth2, proxy_attributes, relabel_configs,
    safe_tls_config, scheme, scrape_class, scrape_limits, scrape_protocols, secret_key_selector,
};
use crate::schema::{Attribute, Validator};

pub static PROBE: CrdKind = CrdKind {
    group: "monitoring.coreos.com",
    version: "v1",
    kind: "Probe",
    plural: "probes",
    namespaced: true,
    description: "The Probe custom resource definition (CRD) defines how to scrape metrics from prober exporters such as the blackbox exporter.",
    spec,
};

fn prober() -> Attribute {
    let mut attrs = vec![
        Attribute::string("path")
            .default_value("/probe")
            .describe("Path to collect metrics from. Defaults to '/probe'."),
        scheme(),
        Attribute::string("url")
            .required()
            .describe("Mandatory URL of the prober.")
            .validate(Validator::length(Some(1), None)),
    ];
    attrs.extend(proxy_attributes());

    Attribute::object("prober", attrs)
        .describe("Specification for the prober to use for probing targets.")
}

fn targets() -> Attribute {
    Attribute::object(
        "targets",
        [
            Attribute::object(
                "ingress",
                [
                    namespace_selector(),
                    relabel_configs("relabelingConfigs"),
                    label_selector("selector"),
                ],
            )
            .describe("Ingress defines the Ingress objects to probe and the relabeling configuration."),
            Attribute::object(
                "staticConfig",
                [
                    Attribute::string_map("labels").describe("Labels assigned to all metrics scraped from the targets."),
                    relabel_configs("relabelingConfigs"),
                    Attribute::string_list("static").describe("The list of hosts to probe."),
                ],
            )
            .describe("StaticConfig defines the static list of targets to probe."),
        ],
    )
    .describe("Targets defines a set of static or dynamically discovered targets to probe.")
}

fn spec() -> Attribute {
    let mut attrs = vec![
        authorization("authorization"),
        basic_auth("basicAuth"),
        secret_key_selector("bearerTokenSecret"),
        fallback_scrape_protocol(),
        duration("interval")
            .describe("Interval at which targets are probed using the configured prober."),
        Attribute::string("jobName").describe("The job name assigned to scraped metrics by default."),
        relabel_configs("metricRelabelings"),
        Attribute::string("module").describe("The module to use for probing specifying how to probe the target."),
        oauth2("oauth2"),
        prober(),
        scrape_class(),
        scrape_protocols(),
        duration("scrapeTimeout"),
        targets(),
        safe_tls_config("tlsConfig"),
    ];
    attrs.extend(scrape_limits());
    attrs.extend(native_histograms());

    Attribute::object("spec", attrs)
        .required()
        .describe("Specification of desired Ingress selection for target discovery by Prometheus.")
}
