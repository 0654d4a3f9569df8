//! `formwright config` — Configuration management commands.

use formwright_config::AppConfig;
use std::path::Path;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();
            let registry = &config.registry;
            let dirs = registry
                .definition_dir
                .iter()
                .chain(&registry.definition_paths)
                .chain(&registry.field_type_dir)
                .chain(&registry.field_type_paths);
            for dir in dirs {
                if !Path::new(dir).is_dir() {
                    warnings.push(format!("Path {dir} is not a directory"));
                }
            }

            if let Some(file) = &config.data.saved_data_file
                && !file.exists()
            {
                warnings.push(format!("Saved data file {} does not exist", file.display()));
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Definitions:  {}", registry.definition_paths.len() + usize::from(registry.definition_dir.is_some()));
            println!("   Field types:  {}", registry.field_type_paths.len() + usize::from(registry.field_type_dir.is_some()));
            println!("   Duplicates:   {:?}", registry.duplicate_policy);
            println!(
                "   Timeout:      {}",
                config
                    .cache
                    .build_timeout_secs
                    .map_or_else(|| "none".to_string(), |s| format!("{s}s"))
            );
            println!("   Dedup:        {}", config.cache.deduplicate);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn config_path_is_valid() {
        let path = formwright_config::AppConfig::config_path();
        assert!(path.to_str().unwrap().ends_with("config.toml"));
        assert!(path.to_str().unwrap().contains(".formwright"));
    }
}
