//! CLI commands

use crdprov_core::{CoreError, Diagnostics, ObjectRef, ProviderSchema, TypeEntry, TypeRole};
use crdprov_kube::{KubeBackend, Provider, ProviderConfig};
use std::path::Path;
use tracing::debug;

use crate::display;
use crate::error::{CliError, Result};

// Offline commands
pub mod manifest;
pub mod plan;
pub mod schema;
pub mod types;
pub mod validate;

// Cluster commands
pub mod apply;
pub mod delete;
pub mod get;
pub mod import;
pub mod read;

/// Resolve a type name, kind or plural for the given role
pub fn resolve_type(name: &str, role: TypeRole) -> Result<&'static TypeEntry> {
    ProviderSchema::global()
        .resolve(name, role)
        .map_err(|e| CliError::usage_with_help(e.to_string(), "run `crdprov types` to list the available types"))
}

/// Parse a `namespace/name` identifier for the kind of `entry`
pub fn parse_id(entry: &TypeEntry, id: &str) -> Result<ObjectRef> {
    ObjectRef::parse_import_id(id, entry.kind.namespaced).map_err(|e: CoreError| CliError::usage(e.to_string()))
}

/// Provider for commands that never contact the cluster
pub fn offline() -> Provider<()> {
    Provider::offline(&ProviderConfig::default())
}

/// Load provider configuration and connect to the cluster
pub async fn connect(config_path: Option<&Path>) -> Result<Provider<KubeBackend>> {
    let config = match config_path {
        Some(path) => ProviderConfig::load_from(path)?,
        None => ProviderConfig::load()?,
    }
    .with_env();
    debug!(field_manager = config.field_manager(), "provider configuration");

    let client = config.connect().await?;
    Ok(Provider::new(KubeBackend::new(client), &config))
}

/// Show the diagnostics of a failed operation and turn them into an error
pub fn fail(diags: Diagnostics) -> CliError {
    display::print_diagnostics(&diags);
    CliError::from_diagnostics(&diags)
}
