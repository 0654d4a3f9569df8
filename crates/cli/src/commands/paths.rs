//! `formwright paths` — List registered composition paths.

use formwright_assembly::loader::registry_from_config;
use formwright_core::CompositionKind;
use formwright_registry::PathRegistry;

use super::{PathArgs, load_config};

pub async fn run(extra: PathArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let registry = registry_from_config(&config.registry);
    extra.register(&registry);
    print!("{}", render(&registry));
    Ok(())
}

fn render(registry: &PathRegistry) -> String {
    let mut out = String::new();
    for kind in CompositionKind::ALL {
        out.push_str(&format!("{kind} ({})\n", registry.len(kind)));
        for (position, location) in registry.list(kind).iter().enumerate() {
            out.push_str(&format!("  {position}: {location}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_kind_in_order() {
        let registry = PathRegistry::new();
        registry.register(CompositionKind::Definition, "forms");
        registry.register(CompositionKind::Definition, "plugins/seo/forms");

        let out = render(&registry);
        assert_eq!(
            out,
            "definition (2)\n  0: forms\n  1: plugins/seo/forms\nfield_type (0)\n"
        );
    }
}
