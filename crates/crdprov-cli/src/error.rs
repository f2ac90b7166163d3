//! CLI error types with exit code handling
//!
//! Every command returns [`CliError`]; `main` renders it through miette and
//! exits with the matching code.

use crdprov_core::Diagnostics;
use crdprov_kube::KubeError;
use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Configuration rejected by the schema
    #[error("Validation failed: {message}")]
    #[diagnostic(code(crdprov::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A provider operation failed
    #[error("{message}")]
    #[diagnostic(code(crdprov::cli::provider))]
    Provider {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Could not reach or configure the cluster connection
    #[error("Cluster connection failed: {message}")]
    #[diagnostic(
        code(crdprov::cli::cluster),
        help("check the kubeconfig, or set CRDPROV_KUBECONFIG / CRDPROV_CONTEXT")
    )]
    Cluster { message: String },

    /// Invalid arguments: unknown type, malformed import ID
    #[error("{message}")]
    #[diagnostic(code(crdprov::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(crdprov::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(crdprov::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Provider { .. } => exit_codes::PROVIDER_ERROR,
            CliError::Cluster { .. } => exit_codes::CLUSTER_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create an input error (user provided an invalid document)
    pub fn input(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: None,
        }
    }

    /// Create a usage error with help text
    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: None,
        }
    }

    /// IO error naming the file involved
    pub fn io_at(path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", path.display(), err),
        }
    }

    /// Summarise the diagnostics of a failed provider operation
    ///
    /// Attribute-level diagnostics are validation failures; anything else is
    /// reported with the first error's summary and detail.
    pub fn from_diagnostics(diags: &Diagnostics) -> Self {
        let errors: Vec<_> = diags.errors().collect();

        if errors.iter().any(|d| d.attribute.is_some()) {
            return Self::Validation {
                message: crate::display::pluralize(errors.len(), "invalid attribute", "invalid attributes"),
                help: None,
            };
        }

        let Some(first) = errors.first() else {
            return Self::Other {
                message: "operation failed".to_string(),
            };
        };

        let (detail, help) = match first.detail.split_once("\nHint: ") {
            Some((detail, hint)) => (detail, Some(hint.to_string())),
            None => (first.detail.as_str(), None),
        };

        Self::Provider {
            message: if detail.is_empty() {
                first.summary.clone()
            } else {
                format!("{}: {}", first.summary, detail)
            },
            help,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Other {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::Other {
            message: format!("YAML error: {}", err),
        }
    }
}

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        match err {
            KubeError::Api(_) | KubeError::Kubeconfig(_) | KubeError::InferConfig(_) => {
                CliError::Cluster {
                    message: err.to_string(),
                }
            }
            KubeError::Io(e) => CliError::from(e),
            KubeError::Serialization(message) => CliError::input(message),
            other => CliError::Other {
                message: other.to_string(),
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
