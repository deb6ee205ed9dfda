//! Command handlers, one module per subcommand.

use std::path::Path;

use boilerplate_adapters::ConfigLoader;
use boilerplate_core::{
    domain::{ConfigTree, Expander},
    error::BoilerplateError,
};

use crate::error::{CliError, CliResult, IntoCli};

pub mod completions;
pub mod config;
pub mod plan;
pub mod plugins;
pub mod run;

/// Load a definition file and expand it into a tree.
pub(crate) fn expand_definition(path: &Path) -> CliResult<ConfigTree> {
    if !path.is_file() {
        return Err(CliError::DefinitionNotFound {
            path: path.to_path_buf(),
        });
    }
    let raw = ConfigLoader::load(path).with_cli_context(|| format!("loading {}", path.display()))?;
    Expander::new()
        .expand(raw)
        .map_err(|e| CliError::Core(BoilerplateError::from(e)))
}
