//! Matching logic for `wait_for`
//!
//! The poll loop itself lives in `crdprov-kube`; this module only decides
//! whether a fetched object satisfies the configured expectations.

use regex::Regex;
use serde_json::Value as JsonValue;

use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::error::{CoreError, Result};
use crate::model::{ConditionMatch, WaitFor};

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Parse a dotted field path such as `status.conditions[0].type`
pub fn parse_field_path(path: &str) -> Result<Vec<PathSegment>> {
    let invalid = |message: &str| CoreError::InvalidFieldPath {
        path: path.to_string(),
        message: message.to_string(),
    };

    if path.is_empty() {
        return Err(invalid("path is empty"));
    }

    let mut segments = Vec::new();
    for part in path.split('.') {
        let (key, mut rest) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };

        if key.is_empty() && segments.is_empty() {
            return Err(invalid("path must start with a field name"));
        }
        if !key.is_empty() {
            segments.push(PathSegment::Key(key.to_string()));
        } else if rest.is_empty() {
            return Err(invalid("empty path segment"));
        }

        while !rest.is_empty() {
            let close = rest.find(']').ok_or_else(|| invalid("unclosed '['"))?;
            let index = rest[1..close]
                .parse::<usize>()
                .map_err(|_| invalid("index must be a non-negative integer"))?;
            segments.push(PathSegment::Index(index));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return Err(invalid("unexpected characters after index"));
            }
        }
    }

    Ok(segments)
}

/// Resolve parsed segments against an object
pub fn lookup<'a>(object: &'a JsonValue, segments: &[PathSegment]) -> Option<&'a JsonValue> {
    segments
        .iter()
        .try_fold(object, |current, segment| match segment {
            PathSegment::Key(key) => current.get(key.as_str()),
            PathSegment::Index(index) => current.get(*index),
        })
}

/// Render a scalar for regex matching; strings are used verbatim
fn render_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

struct FieldMatcher {
    path: String,
    segments: Vec<PathSegment>,
    regex: Regex,
}

/// Compiled form of a [`WaitFor`]
pub struct WaitMatcher {
    fields: Vec<FieldMatcher>,
    conditions: Vec<ConditionMatch>,
}

impl FieldMatcher {
    fn compile(path: &str, pattern: &str) -> Result<Self> {
        let segments = parse_field_path(path)?;
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            CoreError::InvalidWaitPattern {
                path: path.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            path: path.to_string(),
            segments,
            regex,
        })
    }
}

impl WaitMatcher {
    pub fn new(wait: &WaitFor) -> Result<Self> {
        let fields = wait
            .fields
            .iter()
            .map(|(path, pattern)| FieldMatcher::compile(path, pattern))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            fields,
            conditions: wait.conditions.clone(),
        })
    }

    /// Check every field path and pattern, one diagnostic per bad entry
    ///
    /// Diagnostics point at `wait_for.fields.<path>`.
    pub fn check(wait: &WaitFor) -> Diagnostics {
        wait.fields
            .iter()
            .filter_map(|(path, pattern)| {
                FieldMatcher::compile(path, pattern).err().map(|e| {
                    Diagnostic::error("Invalid wait_for field", e.to_string())
                        .with_attribute(format!("wait_for.fields.{}", path))
                })
            })
            .collect()
    }

    /// Whether the object satisfies every expectation
    pub fn matches(&self, object: &JsonValue) -> bool {
        self.unmet(object).is_empty()
    }

    /// Human-readable list of expectations the object does not meet yet
    pub fn unmet(&self, object: &JsonValue) -> Vec<String> {
        let mut unmet = Vec::new();

        for field in &self.fields {
            match lookup(object, &field.segments) {
                Some(value) if field.regex.is_match(&render_value(value)) => {}
                Some(value) => unmet.push(format!(
                    "{} is '{}', want /{}/",
                    field.path,
                    render_value(value),
                    field.regex.as_str()
                )),
                None => unmet.push(format!("{} is not set", field.path)),
            }
        }

        for cond in &self.conditions {
            if !condition_matches(object, cond) {
                unmet.push(format!(
                    "condition {} is not {}",
                    cond.condition_type, cond.status
                ));
            }
        }

        unmet
    }
}

fn condition_matches(object: &JsonValue, expected: &ConditionMatch) -> bool {
    object
        .pointer("/status/conditions")
        .and_then(JsonValue::as_array)
        .into_iter()
        .flatten()
        .any(|c| {
            c.get("type").and_then(JsonValue::as_str) == Some(expected.condition_type.as_str())
                && c.get("status").and_then(JsonValue::as_str) == Some(expected.status.as_str())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn object() -> JsonValue {
        json!({
            "metadata": {"generation": 3},
            "status": {
                "observedGeneration": 3,
                "conditions": [
                    {"type": "Available", "status": "True"},
                    {"type": "Reconciled", "status": "False"}
                ]
            }
        })
    }

    #[test]
    fn test_parse_field_path() {
        assert_eq!(
            parse_field_path("status.conditions[0].type").unwrap(),
            vec![
                PathSegment::Key("status".into()),
                PathSegment::Key("conditions".into()),
                PathSegment::Index(0),
                PathSegment::Key("type".into()),
            ]
        );
        assert_eq!(
            parse_field_path("a[1][2]").unwrap(),
            vec![
                PathSegment::Key("a".into()),
                PathSegment::Index(1),
                PathSegment::Index(2),
            ]
        );
    }

    #[test]
    fn test_parse_field_path_errors() {
        for path in ["", "[0]", "a..b", "a[x]", "a[1", "a[1]b"] {
            assert!(parse_field_path(path).is_err(), "{} should be rejected", path);
        }
    }

    #[test]
    fn test_lookup() {
        let obj = object();
        let segs = parse_field_path("status.conditions[1].status").unwrap();
        assert_eq!(lookup(&obj, &segs), Some(&json!("False")));

        let missing = parse_field_path("status.conditions[5].status").unwrap();
        assert_eq!(lookup(&obj, &missing), None);
    }

    #[test]
    fn test_field_regex_is_anchored() {
        let mut fields = BTreeMap::new();
        fields.insert("status.observedGeneration".to_string(), "3".to_string());
        let wait = WaitFor {
            fields,
            ..WaitFor::default()
        };
        let matcher = WaitMatcher::new(&wait).unwrap();
        assert!(matcher.matches(&object()));

        let mut fields = BTreeMap::new();
        fields.insert("status.observedGeneration".to_string(), "".to_string());
        let wait = WaitFor {
            fields,
            ..WaitFor::default()
        };
        let matcher = WaitMatcher::new(&wait).unwrap();
        assert!(!matcher.matches(&object()));
    }

    #[test]
    fn test_conditions() {
        let wait = WaitFor {
            conditions: vec![ConditionMatch {
                condition_type: "Available".into(),
                status: "True".into(),
            }],
            ..WaitFor::default()
        };
        assert!(WaitMatcher::new(&wait).unwrap().matches(&object()));

        let wait = WaitFor {
            conditions: vec![ConditionMatch {
                condition_type: "Reconciled".into(),
                status: "True".into(),
            }],
            ..WaitFor::default()
        };
        let matcher = WaitMatcher::new(&wait).unwrap();
        assert_eq!(matcher.unmet(&object()), vec!["condition Reconciled is not True"]);
    }

    #[test]
    fn test_missing_field_is_unmet() {
        let mut fields = BTreeMap::new();
        fields.insert("status.phase".to_string(), "Ready".to_string());
        let wait = WaitFor {
            fields,
            ..WaitFor::default()
        };
        let matcher = WaitMatcher::new(&wait).unwrap();
        assert_eq!(matcher.unmet(&object()), vec!["status.phase is not set"]);
    }

    #[test]
    fn test_invalid_regex() {
        let mut fields = BTreeMap::new();
        fields.insert("status.phase".to_string(), "(".to_string());
        let wait = WaitFor {
            fields,
            ..WaitFor::default()
        };
        assert!(matches!(
            WaitMatcher::new(&wait),
            Err(CoreError::InvalidWaitPattern { .. })
        ));
    }

    #[test]
    fn test_check_reports_each_bad_field() {
        let mut fields = BTreeMap::new();
        fields.insert("status.phase".to_string(), "(".to_string());
        fields.insert("status[x]".to_string(), "Ready".to_string());
        fields.insert("status.observedGeneration".to_string(), "[0-9]+".to_string());
        let wait = WaitFor {
            fields,
            ..WaitFor::default()
        };

        let diags = WaitMatcher::check(&wait);
        assert_eq!(diags.len(), 2);
        let paths: Vec<_> = diags.iter().filter_map(|d| d.attribute.as_deref()).collect();
        assert_eq!(paths, ["wait_for.fields.status.phase", "wait_for.fields.status[x]"]);
        assert!(diags.has_errors());
    }
}
