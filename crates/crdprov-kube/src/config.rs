//! Provider configuration
//!
//! Stored as YAML (default `$CONFIG_DIR/crdprov/config.yaml`) and
//! overridable through `CRDPROV_*` environment variables.

use crdprov_core::DEFAULT_FIELD_MANAGER;
use kube::config::{KubeConfigOptions, Kubeconfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{KubeError, Result};

pub const ENV_KUBECONFIG: &str = "CRDPROV_KUBECONFIG";
pub const ENV_CONTEXT: &str = "CRDPROV_CONTEXT";
pub const ENV_FIELD_MANAGER: &str = "CRDPROV_FIELD_MANAGER";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Kubeconfig file; the standard lookup is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Default Server-Side Apply field manager
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_manager: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "humantime_serde"
    )]
    pub request_timeout: Option<Duration>,
}

impl ProviderConfig {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        debug!(path = %path.display(), "loaded provider configuration");
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default configuration path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("crdprov").join("config.yaml"))
    }

    /// Apply `CRDPROV_*` overrides from the process environment
    pub fn with_env(mut self) -> Self {
        self.apply_env(|key| std::env::var(key).ok());
        self
    }

    /// Apply overrides from any variable source
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(path) = lookup(ENV_KUBECONFIG) {
            self.kubeconfig = Some(PathBuf::from(path));
        }
        if let Some(context) = lookup(ENV_CONTEXT) {
            self.context = Some(context);
        }
        if let Some(manager) = lookup(ENV_FIELD_MANAGER) {
            self.field_manager = Some(manager);
        }
    }

    /// Field manager used when a resource does not set one
    pub fn field_manager(&self) -> &str {
        self.field_manager.as_deref().unwrap_or(DEFAULT_FIELD_MANAGER)
    }

    /// Build a Kubernetes client
    ///
    /// Uses the configured kubeconfig and context, falling back to
    /// in-cluster or standard kubeconfig discovery.
    pub async fn connect(&self) -> Result<kube::Client> {
        let options = KubeConfigOptions {
            context: self.context.clone(),
            ..Default::default()
        };

        let mut config = match (&self.kubeconfig, &self.context) {
            (Some(path), _) => {
                let kubeconfig = Kubeconfig::read_from(path)?;
                kube::Config::from_custom_kubeconfig(kubeconfig, &options).await?
            }
            (None, Some(_)) => kube::Config::from_kubeconfig(&options).await?,
            (None, None) => kube::Config::infer().await?,
        };

        if let Some(timeout) = self.request_timeout {
            config.read_timeout = Some(timeout);
            config.write_timeout = Some(timeout);
        }

        debug!(cluster = %config.cluster_url, "connecting");
        kube::Client::try_from(config).map_err(KubeError::Api)
    }
}
