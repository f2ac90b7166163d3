//! Error types for crdprov-kube

use crdprov_core::{CoreError, Diagnostic, Diagnostics};
use thiserror::Error;

/// Result type for crdprov-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur during Kubernetes operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Kubeconfig could not be loaded
    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// Neither in-cluster nor local configuration was found
    #[error("failed to infer Kubernetes configuration: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),

    /// Object does not exist
    #[error("{kind} '{id}' not found")]
    NotFound { kind: String, id: String },

    /// Server-Side Apply conflict with another field manager
    #[error("apply of {kind} '{id}' conflicts with another field manager: {message}\nHint: Set force_conflicts = true to take ownership of the conflicting fields")]
    Conflict {
        kind: String,
        id: String,
        message: String,
    },

    /// Poll loop gave up
    #[error("timed out after {timeout} waiting for {kind} '{id}' {waiting_for}")]
    Timeout {
        kind: String,
        id: String,
        waiting_for: String,
        timeout: String,
    },

    /// Identity change on update
    #[error("cannot change {kind} identity from '{from}' to '{to}' in place, the object must be replaced")]
    RequiresReplacement {
        kind: String,
        from: String,
        to: String,
    },

    /// Invalid provider configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Schema, validation or model error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl KubeError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        match self {
            KubeError::NotFound { .. } => true,
            KubeError::Api(kube::Error::Api(resp)) => resp.code == 404,
            _ => false,
        }
    }

    /// Check if this is a conflict error (409)
    pub fn is_conflict(&self) -> bool {
        match self {
            KubeError::Conflict { .. } => true,
            KubeError::Api(kube::Error::Api(resp)) => resp.code == 409,
            _ => false,
        }
    }

    /// Short summary used as the diagnostic headline
    fn summary(&self) -> &'static str {
        match self {
            KubeError::Api(_) => "Kubernetes API error",
            KubeError::Kubeconfig(_) | KubeError::InferConfig(_) | KubeError::InvalidConfig(_) => {
                "Provider configuration error"
            }
            KubeError::NotFound { .. } => "Object not found",
            KubeError::Conflict { .. } => "Field manager conflict",
            KubeError::Timeout { .. } => "Timeout",
            KubeError::RequiresReplacement { .. } => "Object must be replaced",
            KubeError::Core(CoreError::InvalidImportId { .. }) => "Invalid import identifier",
            KubeError::Core(CoreError::UnknownType { .. }) => "Unknown type",
            KubeError::Core(_) => "Invalid configuration",
            KubeError::Serialization(_) => "Serialization error",
            KubeError::Io(_) => "IO error",
        }
    }

    /// Convert into diagnostics for the caller of a provider operation
    pub fn into_diagnostics(self) -> Diagnostics {
        if let KubeError::Core(CoreError::InvalidConfig(diags)) = self {
            return diags;
        }
        Diagnostic::error(self.summary(), self.to_string()).into()
    }
}
