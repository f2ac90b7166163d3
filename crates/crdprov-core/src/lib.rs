//! Core types for crdprov
//!
//! This crate provides:
//! - The declarative attribute schema model and its JSON Schema compilation
//! - Schemas for the Prometheus Operator kinds
//! - Configuration validation with attribute-level diagnostics
//! - Per-operation data records and manifest rendering

pub mod crds;
pub mod diagnostic;
pub mod error;
pub mod identity;
pub mod manifest;
pub mod model;
pub mod registry;
pub mod schema;
pub mod validate;
pub mod wait;

pub use crds::CrdKind;
pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use error::{CoreError, Result};
pub use identity::ObjectRef;
pub use manifest::{ManifestRenderer, to_yaml};
pub use model::{
    ConditionMatch, DEFAULT_FIELD_MANAGER, DataSourceData, DeletionPropagation, ManifestData,
    Metadata, ResourceData, WaitFor, WaitForDelete,
};
pub use registry::{ProviderSchema, TypeEntry, TypeRole};
pub use schema::{Attribute, AttributeType, Presence, Schema, Validator};
pub use validate::SchemaValidator;
pub use wait::WaitMatcher;
