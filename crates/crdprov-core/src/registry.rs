//! Provider type registry
//!
//! Maps provider type names to CRD kinds. Every kind contributes a
//! resource, a data source (same name) and a manifest data source.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;

use crate::crds::{self, CrdKind};
use crate::error::{CoreError, Result};
use crate::schema::Schema;

/// Maximum Levenshtein distance to consider for suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

static PROVIDER_SCHEMA: Lazy<ProviderSchema> = Lazy::new(ProviderSchema::new);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRole {
    Resource,
    DataSource,
    Manifest,
}

impl TypeRole {
    pub fn label(self) -> &'static str {
        match self {
            TypeRole::Resource => "resource",
            TypeRole::DataSource => "data source",
            TypeRole::Manifest => "manifest data source",
        }
    }
}

impl fmt::Display for TypeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A registered provider type
#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub name: String,
    pub role: TypeRole,
    pub kind: &'static CrdKind,
}

impl TypeEntry {
    pub fn schema(&self) -> Schema {
        match self.role {
            TypeRole::Resource => self.kind.resource_schema(),
            TypeRole::DataSource => self.kind.data_source_schema(),
            TypeRole::Manifest => self.kind.manifest_schema(),
        }
    }
}

/// Every type the provider exposes
#[derive(Debug)]
pub struct ProviderSchema {
    entries: Vec<TypeEntry>,
}

impl ProviderSchema {
    pub fn new() -> Self {
        let entries = crds::all()
            .into_iter()
            .flat_map(|kind| {
                [
                    TypeEntry {
                        name: kind.type_name(),
                        role: TypeRole::Resource,
                        kind,
                    },
                    TypeEntry {
                        name: kind.type_name(),
                        role: TypeRole::DataSource,
                        kind,
                    },
                    TypeEntry {
                        name: kind.manifest_type_name(),
                        role: TypeRole::Manifest,
                        kind,
                    },
                ]
            })
            .collect();

        Self { entries }
    }

    /// Shared registry instance
    pub fn global() -> &'static ProviderSchema {
        &PROVIDER_SCHEMA
    }

    pub fn entries(&self) -> &[TypeEntry] {
        &self.entries
    }

    pub fn by_role(&self, role: TypeRole) -> impl Iterator<Item = &TypeEntry> {
        self.entries.iter().filter(move |e| e.role == role)
    }

    /// Resolve a type for the given role
    ///
    /// Accepts the full type name, the kind (`ServiceMonitor`) or the plural
    /// (`servicemonitors`); the latter two are case-insensitive.
    pub fn resolve(&self, name: &str, role: TypeRole) -> Result<&TypeEntry> {
        self.by_role(role)
            .find(|e| {
                e.name == name
                    || e.kind.kind.eq_ignore_ascii_case(name)
                    || e.kind.plural.eq_ignore_ascii_case(name)
            })
            .ok_or_else(|| CoreError::UnknownType {
                role: role.label(),
                name: name.to_string(),
                suggestion: self.suggest(name, role),
            })
    }

    /// Closest known type name, if any is near enough
    fn suggest(&self, name: &str, role: TypeRole) -> Option<String> {
        self.by_role(role)
            .flat_map(|e| {
                [e.name.as_str(), e.kind.kind, e.kind.plural]
                    .into_iter()
                    .map(move |candidate| (candidate, e))
            })
            .filter_map(|(candidate, entry)| {
                let distance = strsim::levenshtein(
                    &name.to_ascii_lowercase(),
                    &candidate.to_ascii_lowercase(),
                );
                (distance <= MAX_SUGGESTION_DISTANCE).then_some((distance, entry))
            })
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, entry)| entry.name.clone())
    }
}

impl Default for ProviderSchema {
    fn default() -> Self {
        Self::new()
    }
}
