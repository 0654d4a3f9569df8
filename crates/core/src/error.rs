//! Error types for the formwright domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Assembly failures are produced by assemblers and data sources; cache
//! failures wrap them at the cache boundary.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong while assembling a single form.
#[derive(Debug, Clone, Error)]
pub enum AssemblyError {
    #[error("Form definition not found: {name} (searched {searched} path(s))")]
    DefinitionNotFound { name: String, searched: usize },

    #[error("Failed to read {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Failed to parse {origin}: {reason}")]
    Parse { origin: String, reason: String },

    #[error("Form '{form}' is invalid: {reason}")]
    Validation { form: String, reason: String },

    #[error("Unknown field type '{field_type}' for field '{field}'")]
    UnknownFieldType { field: String, field_type: String },

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Failed to bind data to field '{field}': {reason}")]
    Binding { field: String, reason: String },

    #[error("Preprocessor '{hook}' failed: {reason}")]
    Preprocess { hook: String, reason: String },
}

/// Failure returned from `FormCache::get_or_build`.
///
/// Never cached: the entry for the key is left exactly as it was.
#[derive(Debug, Clone, Error)]
pub enum FormCacheError {
    #[error("Form assembly failed: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Failed to compute cache key: {0}")]
    Key(String),

    #[error("Form '{form}' build timed out after {timeout:?}")]
    Timeout { form: String, timeout: Duration },

    #[error("Concurrent build of form '{form}' was abandoned before completing")]
    BuildAbandoned { form: String },
}

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, FormCacheError>;
