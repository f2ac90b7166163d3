//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - configuration rejected by the schema
pub const VALIDATION_ERROR: i32 = 2;

/// Provider error - a cluster operation failed
pub const PROVIDER_ERROR: i32 = 3;

/// Cluster error - no usable connection to the API server
pub const CLUSTER_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
