//! Implementation of the `boilerplate plugins` command.

use std::sync::Arc;

use serde::Serialize;

use boilerplate_adapters::{InMemoryRegistry, LocalFileAccess};
use boilerplate_core::application::BoilerplateService;

use crate::{
    cli::OutputFormat,
    config::AppConfig,
    error::{CliResult, IntoCli},
    output::OutputManager,
};

#[derive(Debug, Serialize)]
struct PluginEntry {
    name: String,
    disabled: bool,
}

pub fn execute(config: AppConfig, output: OutputManager) -> CliResult<()> {
    let registry =
        InMemoryRegistry::with_builtin().with_cli_context(|| "registering built-in plugins")?;
    let service = BoilerplateService::new(Arc::new(LocalFileAccess::new()), Arc::new(registry));

    let names = service
        .plugin_names()
        .with_cli_context(|| "listing plugins")?;
    let entries = entries(names, &config.plugins.disabled);

    match output.format() {
        OutputFormat::Json => output.json(&entries)?,
        _ => {
            output.header("Available Plugins:")?;
            for entry in &entries {
                if entry.disabled {
                    output.print(&format!("  {} (disabled)", entry.name))?;
                } else {
                    output.print(&format!("  {}", entry.name))?;
                }
            }
        }
    }

    Ok(())
}

fn entries(names: Vec<String>, disabled: &[String]) -> Vec<PluginEntry> {
    names
        .into_iter()
        .map(|name| PluginEntry {
            disabled: disabled.contains(&name),
            name,
        })
        .collect()
}
