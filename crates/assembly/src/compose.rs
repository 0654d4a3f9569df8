//! Layered composition of definition documents.
//!
//! Layers apply in order (first is the base, last has highest precedence):
//! - Fields: matched by name; unmatched fields are appended
//! - Field properties: set values override (last wins)
//! - Attributes: deep-merge by key; arrays and scalars are replaced
//! - `rename_to` renames the matched field in place, keeping its position
//! - `remove = true` drops the matched field

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::definition::{DefinitionDoc, FieldDef};

/// Deep merge two JSON values.
///
/// - Objects: deep-merge by key (recursive)
/// - Arrays: replace (second wins entirely)
/// - Scalars and null: second wins
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Merge attribute maps with [`deep_merge`] semantics.
pub fn merge_attributes(
    base: &mut BTreeMap<String, Value>,
    overlay: BTreeMap<String, Value>,
) {
    for (key, value) in overlay {
        let merged = match base.remove(&key) {
            Some(existing) => deep_merge(existing, value),
            None => value,
        };
        base.insert(key, merged);
    }
}

/// Fold every layer onto an empty document.
pub fn compose_layers<I>(layers: I) -> DefinitionDoc
where
    I: IntoIterator<Item = DefinitionDoc>,
{
    layers
        .into_iter()
        .fold(DefinitionDoc::default(), |mut target, layer| {
            apply_layer(&mut target, layer);
            target
        })
}

/// Apply one layer on top of `target`.
pub fn apply_layer(target: &mut DefinitionDoc, layer: DefinitionDoc) {
    if layer.form.label.is_some() {
        target.form.label = layer.form.label;
    }

    for overlay in layer.fields {
        let position = target.fields.iter().position(|f| f.name == overlay.name);

        match position {
            Some(index) if overlay.remove => {
                debug!(field = %overlay.name, "Field removed by override");
                target.fields.remove(index);
            }
            Some(index) => merge_field(&mut target.fields[index], overlay),
            // Nothing to remove
            None if overlay.remove => {}
            None => {
                let mut field = overlay;
                if let Some(new_name) = field.rename_to.take() {
                    field.name = new_name;
                }
                target.fields.push(field);
            }
        }
    }
}

fn merge_field(base: &mut FieldDef, overlay: FieldDef) {
    if let Some(new_name) = overlay.rename_to {
        debug!(from = %base.name, to = %new_name, "Field renamed by override");
        base.name = new_name;
    }
    if overlay.field_type.is_some() {
        base.field_type = overlay.field_type;
    }
    if overlay.label.is_some() {
        base.label = overlay.label;
    }
    if overlay.group.is_some() {
        base.group = overlay.group;
    }
    if overlay.required.is_some() {
        base.required = overlay.required;
    }
    if overlay.default.is_some() {
        base.default = overlay.default;
    }
    merge_attributes(&mut base.attributes, overlay.attributes);
}
