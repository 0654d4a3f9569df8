//! The reference assembler: definition files on disk, layered by the
//! path registry.
//!
//! Assembly steps:
//! 1. Resolve the base definition (a file found in the definition paths, or
//!    inline text)
//! 2. Layer every later fragment of the same file name, in registration order
//! 3. Apply the field-group filter and validate
//! 4. Resolve field types against the field-type paths
//! 5. Load saved data (only when requested), run preprocessors, bind

use async_trait::async_trait;
use formwright_core::{
    AssemblyError, CompositionKind, Form, FormAssembler, FormData, FormDataSource, FormField, FormPreprocessor,
    FormRequest, SourceKind,
};
use formwright_registry::PathRegistry;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::binder::bind;
use crate::compose::{compose_layers, merge_attributes};
use crate::data::NoData;
use crate::definition::{DefinitionDoc, FieldDef, definition_file_name, is_plain_name};
use crate::field_types::{BASE_TYPE_ATTRIBUTE, FieldTypeCatalog};
use crate::validate::{validate, validate_layer};

/// Origin recorded in `Form::sources` for inline definitions.
pub const INLINE_ORIGIN: &str = "<inline>";

/// Builds forms from TOML definitions found through a [`PathRegistry`].
pub struct DefinitionAssembler {
    registry: Arc<PathRegistry>,
    data_source: Arc<dyn FormDataSource>,
    preprocessors: Vec<Arc<dyn FormPreprocessor>>,
}

struct Layers {
    docs: Vec<DefinitionDoc>,
    sources: Vec<String>,
}

impl DefinitionAssembler {
    pub fn new(registry: Arc<PathRegistry>) -> Self {
        Self {
            registry,
            data_source: Arc::new(NoData),
            preprocessors: Vec::new(),
        }
    }

    pub fn with_data_source(mut self, data_source: Arc<dyn FormDataSource>) -> Self {
        self.data_source = data_source;
        self
    }

    /// Add a preprocessor. Preprocessors run in the order they were added.
    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn FormPreprocessor>) -> Self {
        self.preprocessors.push(preprocessor);
        self
    }

    pub fn registry(&self) -> &Arc<PathRegistry> {
        &self.registry
    }

    async fn load_layers(&self, request: &FormRequest) -> Result<Layers, AssemblyError> {
        let dirs = self.registry.list(CompositionKind::Definition);
        let mut layers = Layers {
            docs: Vec::new(),
            sources: Vec::new(),
        };

        // File sources name a file; inline forms look up overrides by form name
        let lookup_name = match request.options.source_kind {
            SourceKind::File => &request.source,
            SourceKind::Inline => &request.name,
        };
        if !is_plain_name(lookup_name) {
            return Err(AssemblyError::Validation {
                form: request.name.clone(),
                reason: format!("'{lookup_name}' is not a plain definition file name"),
            });
        }
        let fragment_name = definition_file_name(lookup_name);

        if request.options.source_kind == SourceKind::Inline {
            let base = DefinitionDoc::parse(&request.source, INLINE_ORIGIN)?;
            validate_layer(&request.name, INLINE_ORIGIN, &base)?;
            layers.docs.push(base);
            layers.sources.push(INLINE_ORIGIN.to_string());
        }

        for dir in &dirs {
            let path = Path::new(dir).join(&fragment_name);
            if let Some(text) = read_optional(&path).await? {
                let origin = path.display().to_string();
                let doc = DefinitionDoc::parse(&text, &origin)?;
                validate_layer(&request.name, &origin, &doc)?;
                layers.docs.push(doc);
                layers.sources.push(origin);
            }
        }

        if layers.docs.is_empty() {
            return Err(AssemblyError::DefinitionNotFound {
                name: fragment_name,
                searched: dirs.len(),
            });
        }

        debug!(form = %request.name, layers = layers.docs.len(), "Definition layers loaded");
        Ok(layers)
    }

    async fn build_fields(
        &self,
        fields: Vec<FieldDef>,
    ) -> Result<Vec<FormField>, AssemblyError> {
        let mut catalog = FieldTypeCatalog::new(
            self.registry
                .list(CompositionKind::FieldType)
                .into_iter()
                .map(PathBuf::from),
        );

        let mut built = Vec::with_capacity(fields.len());
        for def in fields {
            // validate() guarantees a type
            let type_name = def.field_type.clone().unwrap_or_default();
            let resolved = catalog.resolve(&type_name).await?.ok_or_else(|| {
                AssemblyError::UnknownFieldType {
                    field: def.name.clone(),
                    field_type: type_name.clone(),
                }
            })?;

            let mut field = FormField::new(def.name, type_name);
            field.label = def.label;
            field.group = def.group;
            field.required = def.required.unwrap_or(false);
            field.default = def.default;

            // Field attributes win over type defaults
            let mut attributes = resolved.attributes.clone();
            merge_attributes(&mut attributes, def.attributes);
            if resolved.is_custom() {
                attributes.insert(BASE_TYPE_ATTRIBUTE.into(), Value::String(resolved.base.clone()));
            }
            field.attributes = attributes;

            built.push(field);
        }
        Ok(built)
    }
}

#[async_trait]
impl FormAssembler for DefinitionAssembler {
    async fn assemble(&self, request: &FormRequest) -> Result<Form, AssemblyError> {
        let layers = self.load_layers(request).await?;
        let mut doc = compose_layers(layers.docs);

        if let Some(group) = &request.options.field_group {
            doc.fields.retain(|f| f.group.as_deref() == Some(group.as_str()));
        }
        validate(&request.name, &doc)?;

        let mut form = Form::new(request.name.clone());
        form.label = doc.form.label;
        form.sources = layers.sources;
        form.fields = self.build_fields(doc.fields).await?;

        let data = if request.options.load_saved_data {
            self.data_source.load_data(&request.name).await?
        } else {
            FormData::new()
        };

        for preprocessor in &self.preprocessors {
            debug!(form = %request.name, preprocessor = preprocessor.name(), "Running preprocessor");
            preprocessor.preprocess(&mut form, &data).await?;
        }

        bind(&mut form, &data, request.options.control_group.as_deref())?;

        info!(
            form = %request.name,
            fields = form.fields.len(),
            layers = form.sources.len(),
            bound = !data.is_empty(),
            "Form assembled"
        );
        Ok(form)
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, AssemblyError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AssemblyError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StaticDataSource;
    use formwright_core::FormOptions;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    const ARTICLE: &str = r#"
[form]
label = "Article"

[[fields]]
name = "title"
type = "text"
required = true
group = "content"

[[fields]]
name = "hits"
type = "number"
group = "meta"
default = 0
"#;

    fn dir_with(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn registry_with(dirs: &[&TempDir]) -> Arc<PathRegistry> {
        let registry = Arc::new(PathRegistry::new());
        for dir in dirs {
            registry.register(CompositionKind::Definition, dir.path().display().to_string());
        }
        registry
    }

    #[tokio::test]
    async fn assembles_base_definition() {
        let base = dir_with(&[("article.toml", ARTICLE)]);
        let assembler = DefinitionAssembler::new(registry_with(&[&base]));

        let form = assembler.assemble(&FormRequest::file("article", "article")).await.unwrap();
        assert_eq!(form.label.as_deref(), Some("Article"));
        assert_eq!(form.field_names(), vec!["title", "hits"]);
        assert!(form.field("title").unwrap().required);
        assert_eq!(form.sources.len(), 1);
    }

    #[tokio::test]
    async fn fragments_apply_in_registration_order() {
        let base = dir_with(&[("article.toml", ARTICLE)]);
        let first = dir_with(&[("article.toml", "[[fields]]\nname = \"title\"\nlabel = \"First\"\n")]);
        let second = dir_with(&[("article.toml", "[[fields]]\nname = \"title\"\nlabel = \"Second\"\n")]);
        let assembler = DefinitionAssembler::new(registry_with(&[&base, &first, &second]));

        let form = assembler.assemble(&FormRequest::file("article", "article.toml")).await.unwrap();
        assert_eq!(form.field("title").unwrap().label.as_deref(), Some("Second"));
        assert_eq!(form.sources.len(), 3);
    }

    #[tokio::test]
    async fn missing_definition_is_reported() {
        let empty = tempfile::tempdir().unwrap();
        let assembler = DefinitionAssembler::new(registry_with(&[&empty]));

        let err = assembler.assemble(&FormRequest::file("article", "article")).await.unwrap_err();
        match err {
            AssemblyError::DefinitionNotFound { name, searched } => {
                assert_eq!(name, "article.toml");
                assert_eq!(searched, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn duplicate_field_in_one_file_is_rejected() {
        let base = dir_with(&[(
            "article.toml",
            "[[fields]]\nname = \"title\"\ntype = \"text\"\n[[fields]]\nname = \"title\"\ntype = \"number\"\n",
        )]);
        let assembler = DefinitionAssembler::new(registry_with(&[&base]));

        let err = assembler.assemble(&FormRequest::file("article", "article")).await.unwrap_err();
        match err {
            AssemblyError::Validation { form, reason } => {
                assert_eq!(form, "article");
                assert!(reason.contains("duplicate field 'title'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn duplicate_field_in_inline_source_is_rejected() {
        let assembler = DefinitionAssembler::new(Arc::new(PathRegistry::new()));
        let request = FormRequest::inline(
            "contact",
            "[[fields]]\nname = \"email\"\ntype = \"email\"\n[[fields]]\nname = \"email\"\ntype = \"text\"\n",
        );

        assert!(matches!(
            assembler.assemble(&request).await,
            Err(AssemblyError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn path_like_sources_are_rejected() {
        let base = dir_with(&[("article.toml", ARTICLE)]);
        let assembler = DefinitionAssembler::new(registry_with(&[&base]));

        for source in ["../article", "nested/article", ".article"] {
            let err = assembler.assemble(&FormRequest::file("article", source)).await.unwrap_err();
            assert!(matches!(err, AssemblyError::Validation { .. }), "{source}: {err}");
        }

        let inline = FormRequest::inline("../contact", "[[fields]]\nname = \"q\"\ntype = \"text\"\n");
        assert!(matches!(
            assembler.assemble(&inline).await,
            Err(AssemblyError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn inline_source_is_layered_with_named_fragments() {
        let overrides = dir_with(&[("contact.toml", "[[fields]]\nname = \"phone\"\ntype = \"text\"\n")]);
        let assembler = DefinitionAssembler::new(registry_with(&[&overrides]));

        let request = FormRequest::inline("contact", "[[fields]]\nname = \"email\"\ntype = \"email\"\n");
        let form = assembler.assemble(&request).await.unwrap();

        assert_eq!(form.field_names(), vec!["email", "phone"]);
        assert_eq!(form.sources[0], INLINE_ORIGIN);
    }

    #[tokio::test]
    async fn field_group_filter() {
        let base = dir_with(&[("article.toml", ARTICLE)]);
        let assembler = DefinitionAssembler::new(registry_with(&[&base]));

        let request = FormRequest::file("article", "article")
            .with_options(FormOptions::default().with_field_group("meta"));
        let form = assembler.assemble(&request).await.unwrap();
        assert_eq!(form.field_names(), vec!["hits"]);

        let request = FormRequest::file("article", "article")
            .with_options(FormOptions::default().with_field_group("nonexistent"));
        assert!(matches!(
            assembler.assemble(&request).await,
            Err(AssemblyError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn custom_field_type_from_registered_path() {
        let base = dir_with(&[(
            "article.toml",
            "[[fields]]\nname = \"rating\"\ntype = \"stars\"\n[fields.attributes]\nmax = 10\n",
        )]);
        let types = dir_with(&[("stars.toml", "base = \"number\"\n[attributes]\nmax = 5\nstep = 1\n")]);
        let registry = registry_with(&[&base]);
        registry.register(CompositionKind::FieldType, types.path().display().to_string());

        let form = DefinitionAssembler::new(registry)
            .assemble(&FormRequest::file("article", "article"))
            .await
            .unwrap();
        let rating = form.field("rating").unwrap();
        assert_eq!(rating.field_type, "stars");
        assert_eq!(rating.attributes["max"], json!(10));
        assert_eq!(rating.attributes["step"], json!(1));
        assert_eq!(rating.attributes[BASE_TYPE_ATTRIBUTE], json!("number"));
    }

    #[tokio::test]
    async fn unknown_field_type_fails() {
        let base = dir_with(&[("article.toml", "[[fields]]\nname = \"body\"\ntype = \"richtext\"\n")]);
        let assembler = DefinitionAssembler::new(registry_with(&[&base]));

        let err = assembler.assemble(&FormRequest::file("article", "article")).await.unwrap_err();
        assert!(matches!(err, AssemblyError::UnknownFieldType { .. }));
    }

    #[tokio::test]
    async fn saved_data_bound_only_when_requested() {
        let base = dir_with(&[("article.toml", ARTICLE)]);
        let data = Arc::new(StaticDataSource::new());
        data.set("article", json!({"title": "Draft", "hits": "7"}).as_object().cloned().unwrap())
            .await;
        let assembler = DefinitionAssembler::new(registry_with(&[&base])).with_data_source(data);

        let plain = assembler.assemble(&FormRequest::file("article", "article")).await.unwrap();
        assert!(plain.field("title").unwrap().value.is_none());

        let request = FormRequest::file("article", "article").with_options(
            FormOptions::default()
                .with_saved_data(true)
                .with_control_group("jform"),
        );
        let bound = assembler.assemble(&request).await.unwrap();
        assert_eq!(bound.field("title").unwrap().value, Some(json!("Draft")));
        assert_eq!(bound.field("hits").unwrap().value, Some(json!(7)));
        assert_eq!(bound.field("hits").unwrap().input_name, "jform[hits]");
    }

    struct AddCaptcha;

    #[async_trait]
    impl FormPreprocessor for AddCaptcha {
        fn name(&self) -> &str {
            "captcha"
        }

        async fn preprocess(&self, form: &mut Form, _data: &FormData) -> Result<(), AssemblyError> {
            form.fields.push(FormField::new("captcha", "text"));
            Ok(())
        }
    }

    struct Reject;

    #[async_trait]
    impl FormPreprocessor for Reject {
        fn name(&self) -> &str {
            "reject"
        }

        async fn preprocess(&self, _form: &mut Form, _data: &FormData) -> Result<(), AssemblyError> {
            Err(AssemblyError::Preprocess {
                hook: "reject".into(),
                reason: "not allowed".into(),
            })
        }
    }

    #[tokio::test]
    async fn preprocessors_run_before_binding() {
        let base = dir_with(&[("article.toml", ARTICLE)]);
        let assembler = DefinitionAssembler::new(registry_with(&[&base]))
            .with_preprocessor(Arc::new(AddCaptcha));

        let request = FormRequest::file("article", "article")
            .with_options(FormOptions::default().with_control_group("jform"));
        let form = assembler.assemble(&request).await.unwrap();
        assert_eq!(form.field("captcha").unwrap().input_name, "jform[captcha]");
    }

    #[tokio::test]
    async fn preprocessor_failure_aborts_assembly() {
        let base = dir_with(&[("article.toml", ARTICLE)]);
        let assembler = DefinitionAssembler::new(registry_with(&[&base]))
            .with_preprocessor(Arc::new(Reject));

        let err = assembler.assemble(&FormRequest::file("article", "article")).await.unwrap_err();
        assert!(matches!(err, AssemblyError::Preprocess { .. }));
    }
}
