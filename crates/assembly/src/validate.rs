//! Structural checks on a composed definition.

use formwright_core::AssemblyError;
use std::collections::HashSet;

use crate::definition::DefinitionDoc;

/// Reject a single parsed layer that names a field twice or not at all.
///
/// Runs before composition, which would otherwise merge same-named fields of
/// one file into a single field.
pub fn validate_layer(form: &str, origin: &str, doc: &DefinitionDoc) -> Result<(), AssemblyError> {
    let mut seen = HashSet::new();
    for field in &doc.fields {
        if field.name.trim().is_empty() {
            return Err(AssemblyError::Validation {
                form: form.to_string(),
                reason: format!("{origin}: field with an empty name"),
            });
        }
        if !seen.insert(field.name.as_str()) {
            return Err(AssemblyError::Validation {
                form: form.to_string(),
                reason: format!("{origin}: duplicate field '{}'", field.name),
            });
        }
    }
    Ok(())
}

/// Reject definitions that cannot become a usable form.
pub fn validate(form: &str, doc: &DefinitionDoc) -> Result<(), AssemblyError> {
    let invalid = |reason: String| AssemblyError::Validation {
        form: form.to_string(),
        reason,
    };

    if doc.fields.is_empty() {
        return Err(invalid("form has no fields".into()));
    }

    let mut seen = HashSet::new();
    for field in &doc.fields {
        if field.name.trim().is_empty() {
            return Err(invalid("field with an empty name".into()));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(invalid(format!("duplicate field '{}'", field.name)));
        }
        if field.field_type.as_deref().is_none_or(|t| t.trim().is_empty()) {
            return Err(invalid(format!("field '{}' has no type", field.name)));
        }
    }

    Ok(())
}
