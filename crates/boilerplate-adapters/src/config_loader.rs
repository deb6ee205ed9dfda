//! Loading boilerplate definitions from disk.
//!
//! A definition is a nested mapping of scaffolds and targets written in
//! TOML, JSON or YAML. The loader only parses; expansion happens in
//! `boilerplate_core::domain::Expander`.
//!
//! ```toml
//! name = "site"
//!
//! [options]
//! cwd = "templates"
//! pipeline = ["eol", "trim"]
//!
//! [docs]
//! src = "*.md"
//! dest = "out/docs"
//!
//! [assets.css]
//! src = ["css/**/*.css", "!css/vendor/**"]
//! dest = "out/css"
//! ```
//!
//! Saved plans (`boilerplate plan --format json`) are loaded with
//! [`ConfigLoader::load_plan`] and validated before they run.

use std::fs;
use std::path::Path;

use boilerplate_core::{
    application::ApplicationError,
    domain::{ConfigTree, DomainError, DomainValidator as validator, options::kind_of},
    error::{BoilerplateError, BoilerplateResult},
};
use serde_json::Value;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Reads boilerplate definitions and saved plans.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and parse a definition file, choosing the format by extension.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> BoilerplateResult<Value> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            BoilerplateError::configuration(format!(
                "cannot tell the format of {}; use .toml, .json, .yaml or .yml",
                path.display()
            ))
        })?;
        let src = read(path)?;
        let value = Self::parse(&src, format)?;
        debug!(?format, "Loaded boilerplate definition");
        Ok(value)
    }

    /// Parse a definition; the result must be a mapping.
    pub fn parse(src: &str, format: ConfigFormat) -> BoilerplateResult<Value> {
        let parsed = match format {
            ConfigFormat::Toml => toml::from_str::<Value>(src).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str::<Value>(src).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str::<Value>(src).map_err(|e| e.to_string()),
        };
        let value = parsed.map_err(|reason| {
            BoilerplateError::configuration(format!("invalid {format:?} definition: {reason}"))
        })?;

        match value {
            Value::Object(_) => Ok(value),
            // An empty YAML document parses as null.
            Value::Null => Ok(Value::Object(Default::default())),
            other => Err(DomainError::UnrecognizedShape {
                path: "<root>".into(),
                found: kind_of(&other).into(),
            }
            .into()),
        }
    }

    /// Load a saved, already-expanded plan.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load_plan(path: &Path) -> BoilerplateResult<ConfigTree> {
        let src = read(path)?;
        let tree: ConfigTree = serde_json::from_str(&src)
            .map_err(|e| DomainError::InvalidConfig(format!("{}: {e}", path.display())))?;
        validator::validate_tree(&tree)?;
        debug!(targets = tree.target_count(), "Loaded saved plan");
        Ok(tree)
    }
}

fn read(path: &Path) -> BoilerplateResult<String> {
    fs::read_to_string(path).map_err(|e| {
        ApplicationError::FilesystemError {
            path: path.to_path_buf(),
            reason: format!("Failed to read file: {e}"),
        }
        .into()
    })
}
