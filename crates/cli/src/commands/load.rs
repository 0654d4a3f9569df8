//! `formwright load` — Assemble a form and print it as JSON.

use clap::Args;
use formwright_assembly::FormLoader;
use formwright_core::{FormOptions, FormRequest, SourceKind};
use std::path::PathBuf;
use tracing::debug;

use super::{PathArgs, load_config};

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Form name
    pub name: String,

    /// Definition file name (defaults to the form name), or the definition
    /// text itself with --inline
    #[arg(short, long)]
    pub source: Option<String>,

    /// Treat --source as definition text
    #[arg(long, requires = "source")]
    pub inline: bool,

    /// Pre-populate the form with saved data
    #[arg(long)]
    pub load_data: bool,

    /// Saved data JSON file (overrides the configured one)
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Control group wrapping every input name
    #[arg(short, long)]
    pub control: Option<String>,

    /// Keep only fields of this group
    #[arg(short, long)]
    pub group: Option<String>,

    #[command(flatten)]
    pub paths: PathArgs,

    /// Load the form this many times
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,
}

impl LoadArgs {
    fn request(&self) -> FormRequest {
        let source = self.source.clone().unwrap_or_else(|| self.name.clone());
        let mut options = FormOptions::default().with_saved_data(self.load_data);
        if self.inline {
            options = options.with_source_kind(SourceKind::Inline);
        }
        if let Some(control) = &self.control {
            options = options.with_control_group(control.clone());
        }
        if let Some(group) = &self.group {
            options = options.with_field_group(group.clone());
        }
        FormRequest::file(self.name.clone(), source).with_options(options)
    }
}

pub async fn run(args: LoadArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config()?;
    if let Some(data) = &args.data {
        config.data.saved_data_file = Some(data.clone());
    }
    let loader = FormLoader::from_config(&config);
    args.paths.register(loader.registry());
    let request = args.request();

    let mut form = None;
    for _ in 0..args.repeat {
        form = Some(loader.load_request(&request, false).await?);
    }

    let stats = loader.stats().await;
    debug!(
        hits = stats.hits,
        misses = stats.misses,
        builds = stats.builds,
        entries = stats.entries,
        "Cache stats"
    );

    if let Some(form) = form {
        println!("{}", serde_json::to_string_pretty(form.as_ref())?);
    }
    Ok(())
}
