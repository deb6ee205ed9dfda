//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables (`BOILERPLATE_DEFAULTS__MODE=stream`, ...;
//!    `.env` is loaded by `main`)
//! 3. Config file (`--config`, or the platform config directory)
//! 4. Built-in defaults (always present)

use std::path::PathBuf;

use anyhow::Context as _;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Defaults for `boilerplate run`.
    pub defaults: Defaults,
    /// Output settings.
    pub output: OutputConfig,
    /// Plugin settings.
    pub plugins: PluginConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub mode: RunMode,
    /// Directory relative paths resolve against.
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Plugins removed from every resolved pipeline.
    pub disabled: Vec<String>,
}

/// How `boilerplate run` executes targets unless told otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Series,
    Stream,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Series => write!(f, "series"),
            Self::Stream => write!(f, "stream"),
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then the config file, then the
    /// environment.
    ///
    /// `config_file` is the path the user passed via `--config`; it must
    /// exist.  Without it the default location is read if present.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let file = match config_file {
            Some(path) => File::from(path.as_path()).required(true),
            None => File::from(Self::config_path()).required(false),
        };
        Self::load_from(file, Self::environment())
    }

    fn load_from(
        file: File<config::FileSourceFile, config::FileFormat>,
        environment: Environment,
    ) -> anyhow::Result<Self> {
        let defaults =
            Config::try_from(&Self::default()).context("Failed to encode built-in defaults")?;

        Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(environment)
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    fn environment() -> Environment {
        Environment::with_prefix("BOILERPLATE")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("plugins.disabled")
            .try_parsing(true)
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.boilerplate.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "boilerplate", "boilerplate")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".boilerplate.toml"))
    }

    /// Whether a file exists at the default location.
    pub fn config_file_exists() -> bool {
        Self::config_path().is_file()
    }
}
