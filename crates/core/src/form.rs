//! Form model: the request that describes a form and the assembled result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Previously submitted input, keyed by field name.
pub type FormData = serde_json::Map<String, Value>;

/// How the `source` of a request should be interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// `source` names a definition file searched in the definition paths.
    #[default]
    File,
    /// `source` is the definition text itself.
    Inline,
}

/// Options that shape an assembled form. Every field takes part in the
/// cache key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormOptions {
    /// Pre-populate the form with previously submitted data.
    #[serde(default)]
    pub load_saved_data: bool,

    /// Wrapping prefix for input names, e.g. `jform` gives `jform[title]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_group: Option<String>,

    #[serde(default)]
    pub source_kind: SourceKind,

    /// Restrict the form to fields of a single group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_group: Option<String>,

    /// Free-form caller options.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl FormOptions {
    /// Names taken by the typed fields.
    pub const RESERVED_KEYS: &'static [&'static str] =
        &["load_saved_data", "control_group", "source_kind", "field_group"];

    pub fn with_saved_data(mut self, load: bool) -> Self {
        self.load_saved_data = load;
        self
    }

    pub fn with_control_group(mut self, control: impl Into<String>) -> Self {
        self.control_group = Some(control.into());
        self
    }

    pub fn with_field_group(mut self, group: impl Into<String>) -> Self {
        self.field_group = Some(group.into());
        self
    }

    pub fn with_source_kind(mut self, kind: SourceKind) -> Self {
        self.source_kind = kind;
        self
    }

    /// Add a free-form option. Names of typed options are ignored; set those
    /// through their own builders.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if !Self::RESERVED_KEYS.contains(&key.as_str()) {
            self.extra.insert(key, value);
        }
        self
    }
}

/// Everything needed to build (and key) one form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRequest {
    /// Form identifier, e.g. `article`.
    pub name: String,

    /// File name or inline definition text, per `options.source_kind`.
    pub source: String,

    #[serde(default)]
    pub options: FormOptions,
}

impl FormRequest {
    /// A request whose definition is loaded from `<source>` in the definition paths.
    pub fn file(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            options: FormOptions::default(),
        }
    }

    /// A request whose definition text is supplied directly.
    pub fn inline(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: definition.into(),
            options: FormOptions::default().with_source_kind(SourceKind::Inline),
        }
    }

    pub fn with_options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }
}

/// A single field of an assembled form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Type-specific settings (options of a list, max length, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,

    /// Name used for the submitted input, including any control group.
    pub input_name: String,

    /// Bound value, if any data was bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl FormField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            input_name: name.clone(),
            name,
            field_type: field_type.into(),
            label: None,
            group: None,
            required: false,
            default: None,
            attributes: BTreeMap::new(),
            value: None,
        }
    }

    /// The bound value, falling back to the declared default.
    pub fn effective_value(&self) -> Option<&Value> {
        self.value.as_ref().or(self.default.as_ref())
    }
}

/// A fully assembled, validated and (optionally) data-bound form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_group: Option<String>,

    pub fields: Vec<FormField>,

    /// Definition locations merged into this form, in merge order.
    #[serde(default)]
    pub sources: Vec<String>,

    /// The data bound into the form.
    #[serde(default)]
    pub data: FormData,

    pub assembled_at: DateTime<Utc>,
}

impl Form {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            control_group: None,
            fields: Vec::new(),
            sources: Vec::new(),
            data: FormData::new(),
            assembled_at: Utc::now(),
        }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Field names in form order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}
