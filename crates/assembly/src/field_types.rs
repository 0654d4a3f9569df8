//! Field type resolution.
//!
//! Built-in types are always available. Custom types are declared as
//! `<type>.toml` documents inside field-type paths; every path that declares
//! a type contributes, later paths overriding earlier ones:
//!
//! ```toml
//! base = "text"
//!
//! [attributes]
//! pattern = "^[a-z0-9-]+$"
//! ```

use formwright_core::AssemblyError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::debug;

use crate::compose::merge_attributes;
use crate::definition::{definition_file_name, is_plain_name};

/// Types every assembler understands without a declaration.
pub const BUILTIN_FIELD_TYPES: &[&str] = &[
    "text", "textarea", "number", "checkbox", "list", "email", "hidden", "calendar",
];

/// Attribute recording the built-in a custom type extends.
pub const BASE_TYPE_ATTRIBUTE: &str = "base_type";

pub fn is_builtin(type_name: &str) -> bool {
    BUILTIN_FIELD_TYPES.contains(&type_name)
}

#[derive(Debug, Default, Deserialize)]
struct FieldTypeDoc {
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

/// A type after all declarations have been layered.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFieldType {
    pub name: String,
    /// The built-in this type behaves as.
    pub base: String,
    /// Default attributes for fields of this type.
    pub attributes: BTreeMap<String, Value>,
}

impl ResolvedFieldType {
    pub fn is_custom(&self) -> bool {
        self.name != self.base
    }
}

/// Resolves type names against the built-ins and a list of field-type paths.
///
/// Results are memoized for the lifetime of the catalog, which is one
/// assembly.
pub struct FieldTypeCatalog {
    dirs: Vec<PathBuf>,
    resolved: HashMap<String, Option<ResolvedFieldType>>,
}

impl FieldTypeCatalog {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
            resolved: HashMap::new(),
        }
    }

    /// Resolve a type name. `Ok(None)` means no path declares it.
    pub async fn resolve(
        &mut self,
        type_name: &str,
    ) -> Result<Option<ResolvedFieldType>, AssemblyError> {
        if let Some(cached) = self.resolved.get(type_name) {
            return Ok(cached.clone());
        }

        let resolved = if is_builtin(type_name) {
            Some(ResolvedFieldType {
                name: type_name.to_string(),
                base: type_name.to_string(),
                attributes: BTreeMap::new(),
            })
        } else if is_plain_name(type_name) {
            self.load_custom(type_name).await?
        } else {
            None
        };

        self.resolved.insert(type_name.to_string(), resolved.clone());
        Ok(resolved)
    }

    async fn load_custom(
        &self,
        type_name: &str,
    ) -> Result<Option<ResolvedFieldType>, AssemblyError> {
        let file_name = definition_file_name(type_name);
        let mut base: Option<String> = None;
        let mut attributes = BTreeMap::new();
        let mut found = false;

        for dir in &self.dirs {
            let path = dir.join(&file_name);
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(AssemblyError::Io {
                        path,
                        reason: e.to_string(),
                    });
                }
            };

            let doc: FieldTypeDoc = toml::from_str(&text).map_err(|e| AssemblyError::Parse {
                origin: path.display().to_string(),
                reason: e.to_string(),
            })?;
            debug!(field_type = %type_name, path = %path.display(), "Loaded field type declaration");

            found = true;
            if doc.base.is_some() {
                base = doc.base;
            }
            merge_attributes(&mut attributes, doc.attributes);
        }

        if !found {
            return Ok(None);
        }

        let base = base.unwrap_or_else(|| "text".to_string());
        if !is_builtin(&base) {
            return Err(AssemblyError::Parse {
                origin: file_name,
                reason: format!("field type '{type_name}' extends unknown base '{base}'"),
            });
        }

        Ok(Some(ResolvedFieldType {
            name: type_name.to_string(),
            base,
            attributes,
        }))
    }
}
