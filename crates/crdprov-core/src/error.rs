//! Core error types

use thiserror::Error;

use crate::diagnostic::Diagnostics;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Expected import identifier with format: '{expected}'. Got: '{id}'")]
    InvalidImportId { id: String, expected: &'static str },

    #[error("unknown {role} type '{name}'{}", suggestion_suffix(.suggestion))]
    UnknownType {
        role: &'static str,
        name: String,
        suggestion: Option<String>,
    },

    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("invalid configuration:\n{0}")]
    InvalidConfig(Diagnostics),

    #[error("invalid wait_for pattern for '{path}': {message}")]
    InvalidWaitPattern { path: String, message: String },

    #[error("invalid field path '{path}': {message}")]
    InvalidFieldPath { path: String, message: String },

    #[error("Kubernetes response is missing {field}")]
    MalformedObject { field: &'static str },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(", did you mean '{}'?", s))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Diagnostics carried by a configuration error, if any
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            CoreError::InvalidConfig(diags) => Some(diags),
            _ => None,
        }
    }
}
