//! # formwright core
//!
//! Domain types, traits, and error definitions for the formwright form loader.
//! This crate has no knowledge of storage, parsing, or caching: it defines the
//! model that the registry, cache, and assembler crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the cache is a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping the assembler or data source per deployment
//! - Easy testing with closure or stub assemblers
//! - Clean dependency graph (all crates depend inward on core)

pub mod assembler;
pub mod composition;
pub mod error;
pub mod form;

// Re-export key types at crate root for ergonomics
pub use assembler::{FnAssembler, FormAssembler, FormDataSource, FormPreprocessor, assemble_fn};
pub use composition::{CompositionKind, CompositionPath, DuplicatePolicy};
pub use error::{AssemblyError, FormCacheError, Result};
pub use form::{Form, FormData, FormField, FormOptions, FormRequest, SourceKind};
