//! Data sources used to pre-populate forms.

use async_trait::async_trait;
use formwright_core::{AssemblyError, FormData, FormDataSource};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

/// Source that never has data. Used when no data source is configured.
pub struct NoData;

#[async_trait]
impl FormDataSource for NoData {
    fn name(&self) -> &str {
        "none"
    }

    async fn load_data(&self, _form: &str) -> Result<FormData, AssemblyError> {
        Ok(FormData::new())
    }
}

/// In-memory data keyed by form name, e.g. the input of a rejected submission.
#[derive(Default)]
pub struct StaticDataSource {
    data: RwLock<HashMap<String, FormData>>,
}

impl StaticDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored data for `form`.
    pub async fn set(&self, form: impl Into<String>, data: FormData) {
        self.data.write().await.insert(form.into(), data);
    }
}

#[async_trait]
impl FormDataSource for StaticDataSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn load_data(&self, form: &str) -> Result<FormData, AssemblyError> {
        Ok(self.data.read().await.get(form).cloned().unwrap_or_default())
    }
}

/// Reads a JSON file of the shape `{ "<form>": { "<field>": value, ... } }`.
///
/// The file is read on every call so edits are picked up by the next
/// (uncached) build. A missing file means no data.
pub struct JsonFileDataSource {
    path: PathBuf,
}

impl JsonFileDataSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FormDataSource for JsonFileDataSource {
    fn name(&self) -> &str {
        "json_file"
    }

    async fn load_data(&self, form: &str) -> Result<FormData, AssemblyError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No saved data file");
                return Ok(FormData::new());
            }
            Err(e) => {
                return Err(AssemblyError::Io {
                    path: self.path.clone(),
                    reason: e.to_string(),
                });
            }
        };

        let root: Value = serde_json::from_str(&content).map_err(|e| {
            AssemblyError::DataSource(format!("{}: {e}", self.path.display()))
        })?;

        match root.get(form) {
            None | Some(Value::Null) => Ok(FormData::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(other) => Err(AssemblyError::DataSource(format!(
                "data for form '{form}' must be an object, found {other}"
            ))),
        }
    }
}
