//! Reference form assembly for formwright.
//!
//! Definitions are TOML documents found through the
//! [`PathRegistry`](formwright_registry::PathRegistry). Every registered
//! definition path holding a file of the requested name contributes a layer,
//! in registration order. The composed definition is validated, its field
//! types resolved, and the result bound to saved data.
//!
//! [`FormLoader`] ties the registry, the cache and the assembler together.

pub mod assembler;
pub mod binder;
pub mod compose;
pub mod data;
pub mod definition;
pub mod field_types;
pub mod loader;
pub mod validate;

pub use assembler::DefinitionAssembler;
pub use data::{JsonFileDataSource, NoData, StaticDataSource};
pub use definition::{DefinitionDoc, FieldDef};
pub use loader::{FormLoader, registry_from_config};
