//! crdprov Kube - Kubernetes integration for crdprov
//!
//! This crate provides:
//! - **Cluster Backends**: Server-Side Apply against a live cluster, plus an in-memory mock
//! - **Resource Lifecycle**: Create, read, update, delete and import of custom resources
//! - **Wait Loops**: Readiness and deletion polling with timeouts
//! - **Planning**: Create/update/replace decisions with manifest diffs
//! - **Provider Dispatch**: Type resolution and diagnostics for every operation

pub mod backend;
pub mod config;
pub mod data_source;
pub mod error;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod wait;

pub use backend::{ApplyOptions, ClusterBackend, KubeBackend, MockBackend, OperationCounts};
pub use config::ProviderConfig;
pub use data_source::CrdDataSource;
pub use error::{KubeError, Result};
pub use plan::{DiffLine, LineType, PlanAction, PlanResult};
pub use provider::{ApplyOutcome, OperationResult, Provider};
pub use resource::CrdResource;
pub use wait::{wait_for_deletion, wait_for_ready};
