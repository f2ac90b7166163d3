//! `PrometheusRule` (monitoring.coreos.com/v1)
//!
//! Unlike the scrape kinds, several rule group fields use snake_case names
//! in the CRD itself (`partial_response_strategy`, `keep_firing_for`).

use super::CrdKind;
use super::common::{PROMETHEUS_DURATION, duration};
use crate::schema::{Attribute, Validator};

pub static PROMETHEUS_RULE: CrdKind = CrdKind {
    group: "monitoring.coreos.com",
    version: "v1",
    kind: "PrometheusRule",
    plural: "prometheusrules",
    namespaced: true,
    description: "The PrometheusRule custom resource definition (CRD) defines alerting and recording rules to be evaluated by Prometheus or ThanosRuler objects.",
    spec,
};

fn rule() -> Attribute {
    Attribute::list_nested(
        "rules",
        [
            Attribute::string("alert")
                .describe("Name of the alert. Must be a valid label value. Only one of 'record' and 'alert' must be set."),
            Attribute::string_map("annotations")
                .describe("Annotations to add to each alert. Only valid for alerting rules."),
            Attribute::dynamic("expr")
                .required()
                .describe("PromQL expression to evaluate."),
            duration("for").describe("Alerts are considered firing once they have been returned for this long."),
            Attribute::string("keep_firing_for")
                .describe("How long an alert will continue firing after the condition that triggered it has cleared.")
                .validate(Validator::length(Some(1), None))
                .validate(Validator::pattern(PROMETHEUS_DURATION)),
            Attribute::string_map("labels").describe("Labels to add or overwrite."),
            Attribute::string("record")
                .describe("Name of the time series to output to. Must be a valid metric name. Only one of 'record' and 'alert' must be set."),
        ],
    )
    .describe("List of alerting and recording rules.")
    .validate(Validator::min_items(1))
}

fn rule_group() -> Attribute {
    Attribute::list_nested(
        "groups",
        [
            duration("interval").describe("Interval determines how often rules in the group are evaluated."),
            Attribute::string_map("labels").describe("Labels to add or overwrite before storing the result for its rules."),
            Attribute::int64("limit")
                .describe("Limit the number of alerts an alerting rule and series a recording rule can produce.")
                .validate(Validator::at_least(0)),
            Attribute::string("name")
                .required()
                .describe("Name of the rule group.")
                .validate(Validator::length(Some(1), None)),
            Attribute::string("partial_response_strategy")
                .describe("Only used by Thanos Ruler. Valid values are 'warn' and 'abort'.")
                .validate(Validator::pattern("^([Aa][Bb][Oo][Rr][Tt]|[Ww][Aa][Rr][Nn])?$")),
            duration("query_offset").describe("Defines the offset the rule evaluation timestamp of this particular group by the specified duration into the past."),
            rule(),
        ],
    )
    .describe("Content of Prometheus rule file.")
}

fn spec() -> Attribute {
    Attribute::object("spec", [rule_group()])
        .required()
        .describe("Specification of desired alerting rule definitions for Prometheus.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::SchemaValidator;
    use serde_json::json;

    fn config(group: serde_json::Value) -> serde_json::Value {
        json!({
            "metadata": {"name": "node-rules", "namespace": "monitoring"},
            "spec": {"groups": [group]}
        })
    }

    #[test]
    fn test_rule_group_validation() {
        let validator = SchemaValidator::new(PROMETHEUS_RULE.resource_schema()).unwrap();

        let ok = config(json!({
            "name": "node",
            "partial_response_strategy": "Warn",
            "rules": [{
                "alert": "NodeDown",
                "expr": "up{job=\"node\"} == 0",
                "for": "5m",
                "keep_firing_for": "10m",
                "labels": {"severity": "critical"}
            }]
        }));
        assert!(validator.validate(&ok).is_empty());

        let bad_strategy = config(json!({"name": "node", "partial_response_strategy": "retry"}));
        assert!(validator.validate(&bad_strategy).has_errors());

        let no_rules = config(json!({"name": "node", "rules": []}));
        let diags = validator.validate(&no_rules);
        assert!(diags
            .iter()
            .any(|d| d.attribute.as_deref() == Some("spec.groups[0].rules")));

        let missing_expr = config(json!({"name": "node", "rules": [{"record": "x"}]}));
        let diags = validator.validate(&missing_expr);
        assert!(diags.iter().any(|d| d.detail.contains("expr")));
    }

    #[test]
    fn test_snake_case_crd_names_are_kept() {
        let spec = PROMETHEUS_RULE.spec_attribute();
        let manifest = crate::schema::to_manifest_value(
            &spec.attr_type,
            &json!({"groups": [{"name": "g", "query_offset": "1m", "rules": [{"expr": 1, "keep_firing_for": "5m"}]}]}),
        )
        .unwrap();
        assert_eq!(
            manifest,
            json!({"groups": [{"name": "g", "query_offset": "1m", "rules": [{"expr": 1, "keep_firing_for": "5m"}]}]})
        );
    }
}
