//! Declarative attribute schemas
//!
//! A [`Schema`] describes the configuration surface of a resource, data
//! source or manifest data source. Schemas are plain data: the per-kind
//! definitions in [`crate::crds`] only build these values.
//!
//! Every attribute records two names:
//! - the provider name (`snake_case`), used in configuration and state
//! - the Kubernetes JSON name (usually `camelCase`), used on the wire
//!
//! Conversions between the two shapes are driven by the schema, so map
//! attributes such as `labels` keep their user-supplied keys untouched.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// Ordered attribute map, keyed by provider name
pub type Attributes = IndexMap<String, Attribute>;

/// Attribute value type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Bool,
    Int64,
    Float64,
    /// Any JSON value (`x-kubernetes-int-or-string`, free-form objects)
    Dynamic,
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(Attributes),
    ListNested(Attributes),
}

impl AttributeType {
    fn type_name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Bool => "bool",
            AttributeType::Int64 => "int64",
            AttributeType::Float64 => "float64",
            AttributeType::Dynamic => "dynamic",
            AttributeType::List(_) => "list",
            AttributeType::Map(_) => "map",
            AttributeType::Object(_) => "object",
            AttributeType::ListNested(_) => "list_nested",
        }
    }

    /// Nested attributes of object-like types
    pub fn nested(&self) -> Option<&Attributes> {
        match self {
            AttributeType::Object(attrs) | AttributeType::ListNested(attrs) => Some(attrs),
            _ => None,
        }
    }
}

/// Whether an attribute is configured, computed, or both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Required,
    Optional,
    Computed,
    OptionalComputed,
}

impl Presence {
    /// Can the attribute appear in configuration
    pub fn is_configurable(self) -> bool {
        !matches!(self, Presence::Computed)
    }
}

/// Attribute validators
///
/// These map one-to-one onto JSON Schema keywords.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    /// Value must be one of the listed strings
    OneOf(Vec<String>),
    /// String must match the regular expression
    Pattern(String),
    /// String length bounds
    Length {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<u64>,
    },
    /// Numeric bounds
    Range {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    /// Minimum number of list elements
    MinItems(u64),
    /// Applies to every list element
    Items(Box<Validator>),
    /// Applies to every map key
    Keys(Box<Validator>),
    /// Applies to every map value
    Values(Box<Validator>),
}

impl Validator {
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Validator::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn pattern(regex: impl Into<String>) -> Self {
        Validator::Pattern(regex.into())
    }

    pub fn length(min: Option<u64>, max: Option<u64>) -> Self {
        Validator::Length { min, max }
    }

    pub fn at_least(min: i64) -> Self {
        Validator::Range {
            min: Some(min),
            max: None,
        }
    }

    pub fn between(min: i64, max: i64) -> Self {
        Validator::Range {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn min_items(min: u64) -> Self {
        Validator::MinItems(min)
    }

    pub fn items(inner: Validator) -> Self {
        Validator::Items(Box::new(inner))
    }

    pub fn keys(inner: Validator) -> Self {
        Validator::Keys(Box::new(inner))
    }

    pub fn values(inner: Validator) -> Self {
        Validator::Values(Box::new(inner))
    }

    /// Write this validator's keywords into a JSON Schema object
    fn apply(&self, schema: &mut Map<String, JsonValue>) {
        match self {
            Validator::OneOf(values) => {
                schema.insert(
                    "enum".into(),
                    JsonValue::Array(values.iter().cloned().map(JsonValue::String).collect()),
                );
            }
            Validator::Pattern(pattern) => {
                schema.insert("pattern".into(), JsonValue::String(pattern.clone()));
            }
            Validator::Length { min, max } => {
                if let Some(min) = min {
                    schema.insert("minLength".into(), JsonValue::from(*min));
                }
                if let Some(max) = max {
                    schema.insert("maxLength".into(), JsonValue::from(*max));
                }
            }
            Validator::Range { min, max } => {
                if let Some(min) = min {
                    schema.insert("minimum".into(), JsonValue::from(*min));
                }
                if let Some(max) = max {
                    schema.insert("maximum".into(), JsonValue::from(*max));
                }
            }
            Validator::MinItems(min) => {
                schema.insert("minItems".into(), JsonValue::from(*min));
            }
            Validator::Items(inner) => apply_nested(schema, "items", inner),
            Validator::Keys(inner) => apply_nested(schema, "propertyNames", inner),
            Validator::Values(inner) => apply_nested(schema, "additionalProperties", inner),
        }
    }
}

fn apply_nested(schema: &mut Map<String, JsonValue>, keyword: &str, inner: &Validator) {
    let entry = schema
        .entry(keyword.to_string())
        .or_insert_with(|| JsonValue::Object(Map::new()));
    if let JsonValue::Object(nested) = entry {
        inner.apply(nested);
    }
}

/// A single attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    /// Name of the field in the Kubernetes object
    pub json_name: String,

    #[serde(rename = "type")]
    pub attr_type: AttributeType,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    pub presence: Presence,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
}

impl Attribute {
    pub fn new(json_name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            json_name: json_name.into(),
            attr_type,
            description: String::new(),
            presence: Presence::Optional,
            default: None,
            sensitive: false,
            validators: Vec::new(),
        }
    }

    pub fn string(json_name: &str) -> Self {
        Self::new(json_name, AttributeType::String)
    }

    pub fn bool(json_name: &str) -> Self {
        Self::new(json_name, AttributeType::Bool)
    }

    pub fn int64(json_name: &str) -> Self {
        Self::new(json_name, AttributeType::Int64)
    }

    pub fn float64(json_name: &str) -> Self {
        Self::new(json_name, AttributeType::Float64)
    }

    pub fn dynamic(json_name: &str) -> Self {
        Self::new(json_name, AttributeType::Dynamic)
    }

    pub fn string_list(json_name: &str) -> Self {
        Self::new(json_name, AttributeType::List(Box::new(AttributeType::String)))
    }

    pub fn string_map(json_name: &str) -> Self {
        Self::new(json_name, AttributeType::Map(Box::new(AttributeType::String)))
    }

    pub fn object(json_name: &str, attrs: impl IntoIterator<Item = Attribute>) -> Self {
        Self::new(json_name, AttributeType::Object(attributes(attrs)))
    }

    pub fn list_nested(json_name: &str, attrs: impl IntoIterator<Item = Attribute>) -> Self {
        Self::new(json_name, AttributeType::ListNested(attributes(attrs)))
    }

    /// Set the description
    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    pub fn computed(mut self) -> Self {
        self.presence = Presence::Computed;
        self
    }

    pub fn optional_computed(mut self) -> Self {
        self.presence = Presence::OptionalComputed;
        self
    }

    pub fn default_value(mut self, value: impl Into<JsonValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Provider-side attribute name
    pub fn name(&self) -> String {
        snake_case(&self.json_name)
    }

    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    /// JSON Schema fragment for this attribute's configuration
    pub fn to_json_schema(&self) -> JsonValue {
        let mut schema = match type_json_schema(&self.attr_type) {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };

        if !self.description.is_empty() {
            schema.insert(
                "description".into(),
                JsonValue::String(self.description.clone()),
            );
        }
        if let Some(default) = &self.default {
            schema.insert("default".into(), default.clone());
        }
        for validator in &self.validators {
            validator.apply(&mut schema);
        }

        JsonValue::Object(schema)
    }

    /// Turn every nested attribute into a computed one, recursively
    fn into_computed(mut self) -> Self {
        self.presence = Presence::Computed;
        self.default = None;
        self.validators.clear();
        self.attr_type = match self.attr_type {
            AttributeType::Object(attrs) => AttributeType::Object(computed_attributes(attrs)),
            AttributeType::ListNested(attrs) => {
                AttributeType::ListNested(computed_attributes(attrs))
            }
            other => other,
        };
        self
    }
}

fn computed_attributes(attrs: Attributes) -> Attributes {
    attrs
        .into_iter()
        .map(|(name, attr)| (name, attr.into_computed()))
        .collect()
}

/// Collect attributes into an ordered map keyed by provider name
pub fn attributes(attrs: impl IntoIterator<Item = Attribute>) -> Attributes {
    attrs.into_iter().map(|a| (a.name(), a)).collect()
}

/// Convert a Kubernetes JSON name into a provider attribute name
///
/// - `podMetricsEndpoints` -> `pod_metrics_endpoints`
/// - `proxyURL` -> `proxy_url`
/// - `TLSConfig` -> `tls_config`
/// - `keep_firing_for` -> `keep_firing_for`
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '-' || c == '.' {
            out.push('_');
        } else {
            out.push(c);
        }
    }

    out
}

/// Schema of a resource, data source or manifest data source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub description: String,
    pub attributes: Attributes,
}

impl Schema {
    pub fn new(description: impl Into<String>, attrs: impl IntoIterator<Item = Attribute>) -> Self {
        Self {
            description: description.into(),
            attributes: attributes(attrs),
        }
    }

    /// Look up a top-level attribute by provider name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Convert to a draft-07 JSON Schema describing valid configuration
    ///
    /// Computed-only attributes are left out, so setting one is reported as
    /// an unexpected property.
    pub fn to_json_schema(&self) -> JsonValue {
        let mut schema = match object_json_schema(&self.attributes) {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        schema.insert(
            "$schema".into(),
            JsonValue::String("http://json-schema.org/draft-07/schema#".into()),
        );
        if !self.description.is_empty() {
            schema.insert(
                "description".into(),
                JsonValue::String(self.description.clone()),
            );
        }
        JsonValue::Object(schema)
    }

    /// Extract declared defaults as a configuration-shaped value
    pub fn extract_defaults(&self) -> JsonValue {
        extract_attribute_defaults(&self.attributes)
    }

    /// Fill unset attributes with their declared defaults
    pub fn apply_defaults(&self, config: &mut JsonValue) {
        apply_attribute_defaults(&self.attributes, config);
    }

    /// Derive the schema of a live data source
    ///
    /// `metadata.name` and `metadata.namespace` keep their configuration
    /// rules, every other attribute becomes computed.
    pub fn for_data_source(&self, description: impl Into<String>) -> Self {
        let attributes = self
            .attributes
            .iter()
            .map(|(name, attr)| {
                let attr = if name == "metadata" {
                    data_source_metadata(attr.clone())
                } else {
                    attr.clone().into_computed()
                };
                (name.clone(), attr)
            })
            .collect();

        Self {
            description: description.into(),
            attributes,
        }
    }
}

fn data_source_metadata(mut metadata: Attribute) -> Attribute {
    if let AttributeType::Object(attrs) = metadata.attr_type {
        metadata.attr_type = AttributeType::Object(
            attrs
                .into_iter()
                .map(|(name, attr)| {
                    let attr = if name == "name" || name == "namespace" {
                        attr
                    } else {
                        attr.into_computed()
                    };
                    (name, attr)
                })
                .collect(),
        );
    }
    metadata
}

fn type_json_schema(attr_type: &AttributeType) -> JsonValue {
    match attr_type {
        AttributeType::String => serde_json::json!({ "type": "string" }),
        AttributeType::Bool => serde_json::json!({ "type": "boolean" }),
        AttributeType::Int64 => serde_json::json!({ "type": "integer" }),
        AttributeType::Float64 => serde_json::json!({ "type": "number" }),
        AttributeType::Dynamic => JsonValue::Object(Map::new()),
        AttributeType::List(elem) => serde_json::json!({
            "type": "array",
            "items": type_json_schema(elem),
        }),
        AttributeType::Map(elem) => serde_json::json!({
            "type": "object",
            "additionalProperties": type_json_schema(elem),
        }),
        AttributeType::Object(attrs) => object_json_schema(attrs),
        AttributeType::ListNested(attrs) => serde_json::json!({
            "type": "array",
            "items": object_json_schema(attrs),
        }),
    }
}

fn object_json_schema(attrs: &Attributes) -> JsonValue {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for (name, attr) in attrs {
        if !attr.presence.is_configurable() {
            continue;
        }
        properties.insert(name.clone(), attr.to_json_schema());
        if attr.is_required() {
            required.push(JsonValue::String(name.clone()));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".into(), JsonValue::String("object".into()));
    schema.insert("properties".into(), JsonValue::Object(properties));
    schema.insert("additionalProperties".into(), JsonValue::Bool(false));
    if !required.is_empty() {
        schema.insert("required".into(), JsonValue::Array(required));
    }

    JsonValue::Object(schema)
}

fn extract_attribute_defaults(attrs: &Attributes) -> JsonValue {
    let mut defaults = Map::new();

    for (name, attr) in attrs {
        let value = if let Some(default) = &attr.default {
            default.clone()
        } else if let AttributeType::Object(nested) = &attr.attr_type {
            let nested_defaults = extract_attribute_defaults(nested);
            if nested_defaults.is_null() {
                continue;
            }
            nested_defaults
        } else {
            continue;
        };

        defaults.insert(name.clone(), value);
    }

    if defaults.is_empty() {
        JsonValue::Null
    } else {
        JsonValue::Object(defaults)
    }
}

fn apply_attribute_defaults(attrs: &Attributes, config: &mut JsonValue) {
    let Some(obj) = config.as_object_mut() else {
        return;
    };

    for (name, attr) in attrs {
        match obj.get_mut(name) {
            None | Some(JsonValue::Null) => {
                if let Some(default) = &attr.default {
                    obj.insert(name.clone(), default.clone());
                }
            }
            Some(value) => match &attr.attr_type {
                AttributeType::Object(nested) => apply_attribute_defaults(nested, value),
                AttributeType::ListNested(nested) => {
                    if let Some(items) = value.as_array_mut() {
                        for item in items {
                            apply_attribute_defaults(nested, item);
                        }
                    }
                }
                _ => {}
            },
        }
    }
}

/// Remove `null` entries from objects, recursively
///
/// Configuration documents may spell out unset attributes as `null`; they
/// are treated exactly like absent ones.
pub fn prune_nulls(value: &mut JsonValue) {
    match value {
        JsonValue::Object(map) => {
            map.retain(|_, v| !v.is_null());
            for v in map.values_mut() {
                prune_nulls(v);
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                prune_nulls(item);
            }
        }
        _ => {}
    }
}

/// Convert a provider-shaped value into its Kubernetes JSON shape
///
/// Returns `None` for null values. Keys unknown to the schema are dropped.
pub fn to_manifest_value(attr_type: &AttributeType, value: &JsonValue) -> Option<JsonValue> {
    if value.is_null() {
        return None;
    }

    let converted = match attr_type {
        AttributeType::Object(attrs) => {
            let obj = value.as_object()?;
            let mut out = Map::new();
            for (name, attr) in attrs {
                if let Some(v) = obj.get(name).and_then(|v| to_manifest_value(&attr.attr_type, v))
                {
                    out.insert(attr.json_name.clone(), v);
                }
            }
            JsonValue::Object(out)
        }
        AttributeType::ListNested(attrs) => {
            let object_type = AttributeType::Object(attrs.clone());
            convert_list(value, |item| to_manifest_value(&object_type, item))?
        }
        AttributeType::List(elem) => convert_list(value, |item| to_manifest_value(elem, item))?,
        AttributeType::Map(elem) => convert_map(value, |item| to_manifest_value(elem, item))?,
        _ => value.clone(),
    };

    Some(converted)
}

/// Convert a Kubernetes JSON value back into its provider shape
///
/// Fields the schema doesn't know (status, managedFields, server-side
/// additions from newer CRD versions) are dropped.
pub fn from_manifest_value(attr_type: &AttributeType, value: &JsonValue) -> Option<JsonValue> {
    if value.is_null() {
        return None;
    }

    let converted = match attr_type {
        AttributeType::Object(attrs) => {
            let obj = value.as_object()?;
            let mut out = Map::new();
            for (name, attr) in attrs {
                if let Some(v) = obj
                    .get(&attr.json_name)
                    .and_then(|v| from_manifest_value(&attr.attr_type, v))
                {
                    out.insert(name.clone(), v);
                }
            }
            JsonValue::Object(out)
        }
        AttributeType::ListNested(attrs) => {
            let object_type = AttributeType::Object(attrs.clone());
            convert_list(value, |item| from_manifest_value(&object_type, item))?
        }
        AttributeType::List(elem) => convert_list(value, |item| from_manifest_value(elem, item))?,
        AttributeType::Map(elem) => convert_map(value, |item| from_manifest_value(elem, item))?,
        _ => value.clone(),
    };

    Some(converted)
}

fn convert_list(
    value: &JsonValue,
    convert: impl Fn(&JsonValue) -> Option<JsonValue>,
) -> Option<JsonValue> {
    let items = value.as_array()?;
    Some(JsonValue::Array(items.iter().filter_map(convert).collect()))
}

fn convert_map(
    value: &JsonValue,
    convert: impl Fn(&JsonValue) -> Option<JsonValue>,
) -> Option<JsonValue> {
    let obj = value.as_object()?;
    Some(JsonValue::Object(
        obj.iter()
            .filter_map(|(k, v)| convert(v).map(|v| (k.clone(), v)))
            .collect(),
    ))
}

/// Human-readable type description, e.g. `list(object)` or `map(string)`
pub fn describe_type(attr_type: &AttributeType) -> String {
    match attr_type {
        AttributeType::List(elem) => format!("list({})", describe_type(elem)),
        AttributeType::Map(elem) => format!("map({})", describe_type(elem)),
        AttributeType::ListNested(_) => "list(object)".to_string(),
        other => other.type_name().to_string(),
    }
}
