//! Composition paths: locations that contribute form definitions or field
//! types to an assembled form.

use serde::{Deserialize, Serialize};

/// What a composition path contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionKind {
    /// Locations searched for form definition fragments.
    Definition,
    /// Locations searched for custom field type declarations.
    FieldType,
}

impl CompositionKind {
    /// Every kind, in a stable order.
    pub const ALL: [CompositionKind; 2] = [CompositionKind::Definition, CompositionKind::FieldType];
}

impl std::fmt::Display for CompositionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompositionKind::Definition => write!(f, "definition"),
            CompositionKind::FieldType => write!(f, "field_type"),
        }
    }
}

impl std::str::FromStr for CompositionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "definition" | "form" => Ok(CompositionKind::Definition),
            "field_type" | "field-type" | "fields" => Ok(CompositionKind::FieldType),
            other => Err(format!("unknown composition kind: {other}")),
        }
    }
}

/// A single registered location. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionPath {
    pub kind: CompositionKind,
    /// Opaque to the registry; interpreted by the assembler.
    pub location: String,
}

impl CompositionPath {
    pub fn new(kind: CompositionKind, location: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
        }
    }
}

/// What a registry does when a location is registered twice for one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Append every registration; the assembler applies each one.
    #[default]
    Keep,
    /// Skip a location already registered for the same kind.
    Ignore,
}
