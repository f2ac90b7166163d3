//! Configuration validation
//!
//! Schemas are compiled to JSON Schema once and every violation is reported
//! as a [`Diagnostic`] pointing at the offending attribute.

use serde_json::Value as JsonValue;

use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::error::{CoreError, Result};
use crate::schema::Schema;

/// Schema validator with cached compiled schema
pub struct SchemaValidator {
    /// The original schema
    schema: Schema,

    /// Compiled JSON Schema validator
    compiled: jsonschema::Validator,
}

impl SchemaValidator {
    /// Create a new validator from a schema
    pub fn new(schema: Schema) -> Result<Self> {
        let json_schema = schema.to_json_schema();
        let compiled =
            jsonschema::validator_for(&json_schema).map_err(|e| CoreError::InvalidSchema {
                message: e.to_string(),
            })?;

        Ok(Self { schema, compiled })
    }

    /// Validate a configuration document
    ///
    /// `config` is expected to be free of `null` entries, see
    /// [`crate::schema::prune_nulls`].
    pub fn validate(&self, config: &JsonValue) -> Diagnostics {
        if self.compiled.is_valid(config) {
            return Diagnostics::new();
        }

        self.compiled
            .iter_errors(config)
            .map(|e| {
                let path = attribute_path(&e.instance_path.to_string());
                let diag = Diagnostic::error("Invalid attribute configuration", format_error(&e));
                if path.is_empty() {
                    diag
                } else {
                    diag.with_attribute(path)
                }
            })
            .collect()
    }

    /// Get the original schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Format a validation error into a user-friendly message
fn format_error(error: &jsonschema::ValidationError) -> String {
    error.to_string().replace('"', "'")
}

/// Convert a JSON pointer into provider attribute notation
///
/// `/spec/endpoints/0/port` becomes `spec.endpoints[0].port`.
pub fn attribute_path(pointer: &str) -> String {
    let mut path = String::new();

    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
            path.push('[');
            path.push_str(&segment);
            path.push(']');
        } else {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(&segment);
        }
    }

    path
}
