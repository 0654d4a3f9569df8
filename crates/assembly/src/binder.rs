//! Binding submitted data into an assembled form.

use formwright_core::{AssemblyError, Form, FormData};
use serde_json::{Number, Value};

use crate::field_types::BASE_TYPE_ATTRIBUTE;

/// Input name of a field inside an optional control group.
pub fn input_name(control_group: Option<&str>, field: &str) -> String {
    match control_group {
        Some(control) if !control.is_empty() => format!("{control}[{field}]"),
        _ => field.to_string(),
    }
}

/// Bind `data` into `form`.
///
/// Values are matched to fields by name and coerced to the field's base
/// type. Keys without a matching field are kept in `form.data` but bind to
/// nothing.
pub fn bind(form: &mut Form, data: &FormData, control_group: Option<&str>) -> Result<(), AssemblyError> {
    form.control_group = control_group.map(str::to_string);

    for field in &mut form.fields {
        field.input_name = input_name(control_group, &field.name);

        let Some(raw) = data.get(&field.name) else {
            continue;
        };
        let base = field
            .attributes
            .get(BASE_TYPE_ATTRIBUTE)
            .and_then(Value::as_str)
            .unwrap_or(&field.field_type);

        let value = coerce(base, raw).map_err(|reason| AssemblyError::Binding {
            field: field.name.clone(),
            reason,
        })?;
        field.value = Some(value);
    }

    form.data = data.clone();
    Ok(())
}

fn coerce(base: &str, raw: &Value) -> Result<Value, String> {
    match (base, raw) {
        (_, Value::Null) => Ok(Value::Null),
        ("number", Value::Number(_)) => Ok(raw.clone()),
        ("number", Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(Value::Null)
            } else if let Ok(i) = s.parse::<i64>() {
                Ok(Value::Number(i.into()))
            } else {
                s.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| format!("'{s}' is not a number"))
            }
        }
        ("number", other) => Err(format!("expected a number, found {other}")),
        ("checkbox", Value::Bool(_)) => Ok(raw.clone()),
        ("checkbox", Value::Number(n)) => Ok(Value::Bool(n.as_f64().is_some_and(|v| v != 0.0))),
        ("checkbox", Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Ok(Value::Bool(true)),
            "" | "0" | "false" | "off" | "no" => Ok(Value::Bool(false)),
            other => Err(format!("'{other}' is not a checkbox value")),
        },
        ("checkbox", other) => Err(format!("expected a checkbox value, found {other}")),
        _ => Ok(raw.clone()),
    }
}
