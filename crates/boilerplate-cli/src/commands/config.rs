//! `boilerplate config`: read configuration values.

use crate::{
    cli::ConfigCommands,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Dispatch to the correct config subcommand.
pub fn execute(cmd: ConfigCommands, config: AppConfig, output: OutputManager) -> CliResult<()> {
    match cmd {
        ConfigCommands::Get { key } => {
            let value = get_config_value(&config, &key)?;
            output.print(&format!("{key} = {value}"))?;
        }

        ConfigCommands::List => {
            output.header("Current Configuration:")?;
            let serialised =
                toml::to_string_pretty(&config).map_err(|e| CliError::ConfigError {
                    message: format!("Failed to serialise config: {e}"),
                    source: Some(Box::new(e)),
                })?;
            output.print(&serialised)?;
        }

        ConfigCommands::Path => {
            let path = AppConfig::config_path();
            if AppConfig::config_file_exists() {
                output.print(&path.display().to_string())?;
            } else {
                output.print(&format!("{} (not created)", path.display()))?;
            }
        }
    }

    Ok(())
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn get_config_value(config: &AppConfig, key: &str) -> CliResult<String> {
    match key {
        "defaults.mode" => Ok(config.defaults.mode.to_string()),
        "defaults.cwd" => Ok(config
            .defaults
            .cwd
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()),
        "output.no_color" => Ok(config.output.no_color.to_string()),
        "output.format" => serde_json::to_value(config.output.format)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .ok_or_else(|| CliError::ConfigError {
                message: "output.format has no string form".into(),
                source: None,
            }),
        "plugins.disabled" => Ok(config.plugins.disabled.join(",")),
        _ => Err(CliError::ConfigError {
            message: format!("Unknown config key: '{key}'"),
            source: None,
        }),
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
