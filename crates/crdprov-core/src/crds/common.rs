//! Schema fragments shared by several Prometheus Operator kinds

use crate::schema::{Attribute, AttributeType, Validator, attributes};

/// Prometheus duration, e.g. `30s` or `1h30m`
pub const PROMETHEUS_DURATION: &str = r"^(0|(([0-9]+)y)?(([0-9]+)w)?(([0-9]+)d)?(([0-9]+)h)?(([0-9]+)m)?(([0-9]+)s)?(([0-9]+)ms)?)$";

/// Byte size such as `10MB` or `1.5GiB`
pub const BYTE_SIZE: &str = r"(^0|([0-9]*[.])?[0-9]+((K|M|G|T|E|P)i?)?B)$";

const LABEL_NAME: &str = r"^[a-zA-Z_][a-zA-Z0-9_]*$";

const PROXY_URL: &str = r"^(http|https|socks5)://.+$";

pub const RELABEL_ACTIONS: &[&str] = &[
    "replace",
    "Replace",
    "keep",
    "Keep",
    "drop",
    "Drop",
    "hashmod",
    "HashMod",
    "labelmap",
    "LabelMap",
    "labeldrop",
    "LabelDrop",
    "labelkeep",
    "LabelKeep",
    "lowercase",
    "Lowercase",
    "uppercase",
    "Uppercase",
    "keepequal",
    "KeepEqual",
    "dropequal",
    "DropEqual",
];

pub const SCRAPE_PROTOCOLS: &[&str] = &[
    "PrometheusProto",
    "OpenMetricsText0.0.1",
    "OpenMetricsText1.0.0",
    "PrometheusText0.0.4",
    "PrometheusText1.0.0",
];

const TLS_VERSIONS: &[&str] = &["TLS10", "TLS11", "TLS12", "TLS13"];

pub fn duration(json_name: &str) -> Attribute {
    Attribute::string(json_name).validate(Validator::pattern(PROMETHEUS_DURATION))
}

fn key_selector_fields(kind: &str) -> Vec<Attribute> {
    vec![
        Attribute::string("key")
            .required()
            .describe(&format!("The key of the {} to select from.", kind)),
        Attribute::string("name").describe("Name of the referent."),
        Attribute::bool("optional")
            .describe(&format!("Specify whether the {} or its key must be defined.", kind)),
    ]
}

pub fn secret_key_selector(json_name: &str) -> Attribute {
    Attribute::object(json_name, key_selector_fields("Secret"))
}

pub fn config_map_key_selector(json_name: &str) -> Attribute {
    Attribute::object(json_name, key_selector_fields("ConfigMap"))
}

/// Either a ConfigMap or a Secret key
pub fn secret_or_config_map(json_name: &str) -> Attribute {
    Attribute::object(
        json_name,
        [
            config_map_key_selector("configMap").describe("ConfigMap containing data to use for the targets."),
            secret_key_selector("secret").describe("Secret containing data to use for the targets."),
        ],
    )
}

fn safe_tls_fields() -> Vec<Attribute> {
    vec![
        secret_or_config_map("ca").describe("Certificate authority used when verifying server certificates."),
        secret_or_config_map("cert").describe("Client certificate to present when doing client-authentication."),
        Attribute::bool("insecureSkipVerify").describe("Disable target certificate validation."),
        secret_key_selector("keySecret").describe("Secret containing the client key file for the targets."),
        Attribute::string("maxVersion").validate(Validator::one_of(TLS_VERSIONS.iter().copied())),
        Attribute::string("minVersion").validate(Validator::one_of(TLS_VERSIONS.iter().copied())),
        Attribute::string("serverName").describe("Used to verify the hostname for the targets."),
    ]
}

/// TLS configuration that only references Kubernetes objects
pub fn safe_tls_config(json_name: &str) -> Attribute {
    Attribute::object(json_name, safe_tls_fields()).describe("TLS configuration to use when scraping the target.")
}

/// TLS configuration that may also reference files on the Prometheus container
pub fn tls_config(json_name: &str) -> Attribute {
    let mut fields = safe_tls_fields();
    fields.extend([
        Attribute::string("caFile").describe("Path to the CA cert in the Prometheus container."),
        Attribute::string("certFile").describe("Path to the client cert file in the Prometheus container."),
        Attribute::string("keyFile").describe("Path to the client key file in the Prometheus container."),
    ]);
    Attribute::object(json_name, fields).describe("TLS configuration to use when scraping the target.")
}

pub fn basic_auth(json_name: &str) -> Attribute {
    Attribute::object(
        json_name,
        [
            secret_key_selector("password").describe("Secret key containing the password for authentication."),
            secret_key_selector("username").describe("Secret key containing the username for authentication."),
        ],
    )
    .describe("BasicAuth configuration for the target.")
}

pub fn authorization(json_name: &str) -> Attribute {
    Attribute::object(
        json_name,
        [
            secret_key_selector("credentials").describe("Secret key that contains the credentials of the request."),
            Attribute::string("type").describe("Defines the authentication type. Defaults to 'Bearer'."),
        ],
    )
    .describe("Authorization section for the target.")
}

/// Proxy settings shared by endpoints, probers and OAuth2
pub fn proxy_attributes() -> Vec<Attribute> {
    vec![
        Attribute::string("noProxy").describe("Comma-separated hosts excluded from proxying."),
        Attribute::new(
            "proxyConnectHeader",
            AttributeType::Map(Box::new(AttributeType::ListNested(attributes(
                key_selector_fields("Secret"),
            )))),
        )
        .describe("Headers to send to proxies during CONNECT requests."),
        Attribute::bool("proxyFromEnvironment").describe("Use the proxy configuration defined by environment variables."),
        Attribute::string("proxyUrl")
            .describe("HTTP proxy server to use. May carry credentials in its user info.")
            .sensitive()
            .validate(Validator::pattern(PROXY_URL)),
    ]
}

pub fn oauth2(json_name: &str) -> Attribute {
    let mut fields = vec![
        secret_or_config_map("clientId")
            .required()
            .describe("Secret or ConfigMap containing the OAuth2 client id."),
        secret_key_selector("clientSecret")
            .required()
            .describe("Secret containing the OAuth2 client secret."),
        Attribute::string_map("endpointParams").describe("Parameters to append to the token URL."),
        Attribute::string_list("scopes").describe("OAuth2 scopes used for the token request."),
        Attribute::string("tokenUrl")
            .required()
            .describe("The URL to fetch the token from.")
            .validate(Validator::length(Some(1), None)),
        safe_tls_config("tlsConfig").describe("TLS configuration to use when connecting to the OAuth2 server."),
    ];
    fields.extend(proxy_attributes());

    Attribute::object(json_name, fields).describe("OAuth2 configuration to use when scraping the target.")
}

/// Relabeling rules
pub fn relabel_configs(json_name: &str) -> Attribute {
    Attribute::list_nested(
        json_name,
        [
            Attribute::string("action")
                .describe("Action to perform based on the regex matching.")
                .default_value("replace")
                .validate(Validator::one_of(RELABEL_ACTIONS.iter().copied())),
            Attribute::int64("modulus").describe("Modulus to take of the hash of the source label values."),
            Attribute::string("regex").describe("Regular expression against which the extracted value is matched."),
            Attribute::string("replacement").describe("Replacement value against which a Replace action is performed."),
            Attribute::string("separator").describe("Separator is the string between concatenated source labels."),
            Attribute::string_list("sourceLabels")
                .describe("The source labels select values from existing labels.")
                .validate(Validator::items(Validator::pattern(LABEL_NAME))),
            Attribute::string("targetLabel").describe("Label to which the resulting string is written."),
        ],
    )
}

/// Standard Kubernetes label selector
pub fn label_selector(json_name: &str) -> Attribute {
    Attribute::object(
        json_name,
        [
            Attribute::list_nested(
                "matchExpressions",
                [
                    Attribute::string("key").required(),
                    Attribute::string("operator")
                        .required()
                        .validate(Validator::one_of(["In", "NotIn", "Exists", "DoesNotExist"])),
                    Attribute::string_list("values"),
                ],
            )
            .describe("A list of label selector requirements. The requirements are ANDed."),
            Attribute::string_map("matchLabels").describe("A map of key-value pairs. The requirements are ANDed."),
        ],
    )
}

pub fn namespace_selector() -> Attribute {
    Attribute::object(
        "namespaceSelector",
        [
            Attribute::bool("any").describe("Select all namespaces."),
            Attribute::string_list("matchNames").describe("List of namespace names to select from."),
        ],
    )
    .describe("Selector to select which namespaces the targets are discovered from.")
}

pub fn attach_metadata() -> Attribute {
    Attribute::object(
        "attachMetadata",
        [Attribute::bool("node").describe("Adds node labels and annotations to discovered targets.")],
    )
}

pub fn scrape_protocols() -> Attribute {
    Attribute::string_list("scrapeProtocols")
        .describe("Protocols to negotiate during a scrape, in order of preference.")
        .validate(Validator::items(Validator::one_of(SCRAPE_PROTOCOLS.iter().copied())))
}

pub fn fallback_scrape_protocol() -> Attribute {
    Attribute::string("fallbackScrapeProtocol")
        .describe("Protocol to use if a scrape returns a blank, unparseable, or otherwise invalid Content-Type.")
        .validate(Validator::one_of(SCRAPE_PROTOCOLS.iter().copied()))
}

pub fn scrape_class() -> Attribute {
    Attribute::string("scrapeClass")
        .describe("The scrape class to apply.")
        .validate(Validator::length(Some(1), None))
}

pub fn scheme() -> Attribute {
    Attribute::string("scheme")
        .describe("HTTP scheme to use for scraping.")
        .validate(Validator::one_of(["http", "https"]))
}

/// Per-scrape limits on samples, targets and labels
pub fn scrape_limits() -> Vec<Attribute> {
    let limit = |json_name: &str, description: &str| {
        Attribute::int64(json_name)
            .describe(description)
            .validate(Validator::at_least(0))
    };

    vec![
        limit("keepDroppedTargets", "Per-scrape limit on the number of targets dropped by relabeling that will be kept in memory."),
        limit("labelLimit", "Per-scrape limit on number of labels that will be accepted for a sample."),
        limit("labelNameLengthLimit", "Per-scrape limit on length of labels name that will be accepted for a sample."),
        limit("labelValueLengthLimit", "Per-scrape limit on length of labels value that will be accepted for a sample."),
        limit("sampleLimit", "Per-scrape limit on the number of scraped samples that will be accepted."),
        limit("targetLimit", "Limit on the number of scraped targets that will be accepted."),
    ]
}

pub fn native_histograms() -> Vec<Attribute> {
    vec![
        Attribute::int64("nativeHistogramBucketLimit")
            .describe("If there are more than this many buckets in a native histogram, buckets will be merged.")
            .validate(Validator::at_least(0)),
        Attribute::dynamic("nativeHistogramMinBucketFactor")
            .describe("If the growth factor of one bucket to the next is smaller than this, buckets will be merged."),
        Attribute::bool("scrapeClassicHistograms")
            .describe("Whether to scrape a classic histogram that is also exposed as a native histogram."),
    ]
}

/// Attributes common to ServiceMonitor endpoints and PodMonitor endpoints
pub fn scrape_endpoint_attributes() -> Vec<Attribute> {
    let mut attrs = vec![
        authorization("authorization"),
        basic_auth("basicAuth"),
        secret_key_selector("bearerTokenSecret")
            .describe("Secret to mount to read bearer token for scraping targets."),
        Attribute::bool("enableHttp2").describe("Whether to enable HTTP2."),
        Attribute::bool("filterRunning").describe("Drop targets whose pods are not running."),
        Attribute::bool("followRedirects").describe("Whether the scrape requests should follow HTTP 3xx redirects."),
        Attribute::bool("honorLabels").describe("Keep the target's labels when they collide with server-side labels."),
        Attribute::bool("honorTimestamps").describe("Whether Prometheus preserves the timestamps exposed by the target."),
        duration("interval").describe("Interval at which Prometheus scrapes the metrics from the target."),
        relabel_configs("metricRelabelings").describe("Relabeling rules applied to the samples before ingestion."),
        oauth2("oauth2"),
        Attribute::new(
            "params",
            AttributeType::Map(Box::new(AttributeType::List(Box::new(AttributeType::String)))),
        )
        .describe("Optional HTTP URL parameters."),
        Attribute::string("path").describe("HTTP path from which to scrape for metrics."),
        relabel_configs("relabelings").describe("Relabeling rules applied to the target's metadata labels."),
        scheme(),
        duration("scrapeTimeout").describe("Timeout after which Prometheus considers the scrape to be failed."),
        Attribute::dynamic("targetPort").describe("Name or number of the target port."),
        Attribute::bool("trackTimestampsStaleness")
            .describe("Whether Prometheus tracks staleness of the metrics that have an explicit timestamp."),
    ];
    attrs.extend(proxy_attributes());
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_prometheus_duration_pattern() {
        let re = Regex::new(PROMETHEUS_DURATION).unwrap();
        for ok in ["0", "30s", "1h30m", "500ms", "2w", "1y"] {
            assert!(re.is_match(ok), "{} should match", ok);
        }
        for bad in ["30", "1.5s", "s", "30 s", "-1s"] {
            assert!(!re.is_match(bad), "{} should not match", bad);
        }
    }

    #[test]
    fn test_byte_size_pattern() {
        let re = Regex::new(BYTE_SIZE).unwrap();
        assert!(re.is_match("10MB"));
        assert!(re.is_match("1.5GiB"));
        assert!(!re.is_match("10"));
    }

    #[test]
    fn test_relabel_action_default() {
        let attr = relabel_configs("relabelings");
        let item = &attr.attr_type.nested().unwrap()["action"];
        assert_eq!(item.default, Some(serde_json::json!("replace")));
    }

    #[test]
    fn test_endpoint_attribute_names_are_unique() {
        let attrs = attributes(scrape_endpoint_attributes());
        assert_eq!(attrs.len(), scrape_endpoint_attributes().len());
        assert!(attrs.contains_key("proxy_url"));
        assert!(attrs.contains_key("enable_http2"));
    }

    #[test]
    fn test_proxy_url_is_sensitive() {
        let attrs = attributes(proxy_attributes());
        assert!(attrs["proxy_url"].sensitive);
        assert!(!attrs["no_proxy"].sensitive);

        let json = serde_json::to_value(&attrs["proxy_url"]).unwrap();
        assert_eq!(json["sensitive"], true);
    }
}
