//! One-call form loading on top of the registry, cache and assembler.

use formwright_cache::{CacheConfig, CacheStats, FormCache};
use formwright_config::{AppConfig, RegistryConfig};
use formwright_core::{
    CompositionKind, Form, FormAssembler, FormDataSource, FormOptions, FormRequest,
};
use formwright_registry::PathRegistry;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::assembler::DefinitionAssembler;
use crate::data::{JsonFileDataSource, NoData};

/// Build a registry from configuration.
///
/// The component's own definition and field-type directories are registered
/// first so component files form the base layer; configured paths follow in
/// order. Callers may append further paths afterwards.
pub fn registry_from_config(settings: &RegistryConfig) -> Arc<PathRegistry> {
    let registry = Arc::new(PathRegistry::with_policy(settings.duplicate_policy));

    if let Some(dir) = &settings.definition_dir {
        registry.register(CompositionKind::Definition, dir.as_str());
    }
    if let Some(dir) = &settings.field_type_dir {
        registry.register(CompositionKind::FieldType, dir.as_str());
    }

    registry.register_all(CompositionKind::Definition, settings.definition_paths.iter().cloned());
    registry.register_all(CompositionKind::FieldType, settings.field_type_paths.iter().cloned());
    registry
}

/// Loads forms by name, building each distinct request at most once.
pub struct FormLoader {
    registry: Arc<PathRegistry>,
    cache: FormCache,
    assembler: Arc<dyn FormAssembler>,
}

impl FormLoader {
    /// Loader backed by a [`DefinitionAssembler`] over `registry`.
    pub fn new(registry: Arc<PathRegistry>, config: CacheConfig) -> Self {
        let assembler = Arc::new(DefinitionAssembler::new(registry.clone()));
        Self::with_assembler(registry, config, assembler)
    }

    pub fn with_assembler(
        registry: Arc<PathRegistry>,
        config: CacheConfig,
        assembler: Arc<dyn FormAssembler>,
    ) -> Self {
        Self {
            registry,
            cache: FormCache::with_config(config),
            assembler,
        }
    }

    /// Loader wired from configuration: registry per
    /// [`registry_from_config`], saved data from `[data]`, cache settings from
    /// `[cache]`.
    pub fn from_config(config: &AppConfig) -> Self {
        let registry = registry_from_config(&config.registry);

        let data_source: Arc<dyn FormDataSource> = match &config.data.saved_data_file {
            Some(path) => Arc::new(JsonFileDataSource::new(path.clone())),
            None => Arc::new(NoData),
        };
        let assembler = DefinitionAssembler::new(registry.clone()).with_data_source(data_source);

        let cache_config = CacheConfig {
            build_timeout: config.cache.build_timeout(),
            deduplicate: config.cache.deduplicate,
        };
        Self::with_assembler(registry, cache_config, Arc::new(assembler))
    }

    /// Load a form, building it on first use or when `clear` is set.
    pub async fn load(
        &self,
        name: &str,
        source: &str,
        options: FormOptions,
        clear: bool,
    ) -> formwright_core::Result<Arc<Form>> {
        let request = FormRequest::file(name, source).with_options(options);
        self.load_request(&request, clear).await
    }

    pub async fn load_request(
        &self,
        request: &FormRequest,
        clear: bool,
    ) -> formwright_core::Result<Arc<Form>> {
        debug!(form = %request.name, source_kind = ?request.options.source_kind, clear, "Loading form");
        self.cache
            .get_or_build(request, clear, self.assembler.as_ref())
            .await
            .inspect_err(|e| warn!(form = %request.name, error = %e, "Form load failed"))
    }

    pub fn registry(&self) -> &Arc<PathRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &FormCache {
        &self.cache
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}
