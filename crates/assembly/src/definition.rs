//! Form definition documents.
//!
//! A definition is a TOML document with an optional `[form]` header and a
//! list of `[[fields]]`. The same format is used for base definitions and for
//! override fragments; fragments usually name only the fields they change.
//!
//! ```toml
//! [form]
//! label = "Article"
//!
//! [[fields]]
//! name = "title"
//! type = "text"
//! required = true
//!
//! [fields.attributes]
//! maxlength = 255
//! ```

use formwright_core::AssemblyError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// File extension of definition and field type documents.
pub const DEFINITION_EXTENSION: &str = "toml";

/// A parsed definition document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionDoc {
    #[serde(default)]
    pub form: FormHeader,

    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// The `[form]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// One `[[fields]]` entry. Every property is optional so fragments can
/// override selectively; a field first introduced without `type` fails
/// validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,

    /// Rename an existing field (fragments only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_to: Option<String>,

    /// Drop an existing field (fragments only).
    #[serde(default)]
    pub remove: bool,
}

impl DefinitionDoc {
    /// Parse a definition. `origin` names the file or source for error messages.
    pub fn parse(text: &str, origin: &str) -> Result<Self, AssemblyError> {
        toml::from_str(text).map_err(|e| AssemblyError::Parse {
            origin: origin.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Whether `name` can be joined onto a search directory as a single file
/// name: no separators, no leading dot.
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Append the definition extension to a bare file name.
pub fn definition_file_name(source: &str) -> String {
    let suffix = format!(".{DEFINITION_EXTENSION}");
    if source.ends_with(&suffix) {
        source.to_string()
    } else {
        format!("{source}{suffix}")
    }
}
