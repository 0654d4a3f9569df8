pub mod config_cmd;
pub mod load;
pub mod paths;

use clap::Args;
use formwright_config::AppConfig;
use formwright_core::CompositionKind;
use formwright_registry::PathRegistry;

/// Paths registered on top of the configured ones.
#[derive(Args, Debug, Default)]
pub struct PathArgs {
    /// Add a definition path (repeatable, registered in order)
    #[arg(long = "path", value_name = "DIR")]
    pub definition_paths: Vec<String>,

    /// Add a field-type path (repeatable, registered in order)
    #[arg(long = "field-path", value_name = "DIR")]
    pub field_type_paths: Vec<String>,
}

impl PathArgs {
    /// Append these paths after everything already registered.
    pub fn register(&self, registry: &PathRegistry) {
        registry.register_all(CompositionKind::Definition, self.definition_paths.iter().cloned());
        registry.register_all(CompositionKind::FieldType, self.field_type_paths.iter().cloned());
    }
}

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwright_assembly::loader::registry_from_config;

    #[test]
    fn command_line_paths_follow_configured_ones() {
        let mut config = AppConfig::default();
        config.registry.definition_paths = vec!["plugins/seo".into()];
        let extra = PathArgs {
            definition_paths: vec!["cli/forms".into()],
            field_type_paths: vec!["cli/fields".into()],
        };

        let registry = registry_from_config(&config.registry);
        extra.register(&registry);
        assert_eq!(
            registry.list(CompositionKind::Definition),
            vec!["forms", "plugins/seo", "cli/forms"]
        );
        assert_eq!(registry.list(CompositionKind::FieldType), vec!["fields", "cli/fields"]);
    }
}
