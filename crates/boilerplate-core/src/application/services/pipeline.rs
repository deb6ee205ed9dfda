//! Pipeline resolution and execution.
//!
//! A node's `pipeline` option names its transform steps. Names resolve
//! against the tree's inline steps first, then the plugin registry. Steps
//! run in declared order; a step returning `None` drops the file.

use std::fmt;
use std::sync::Arc;

use crate::{
    application::{ApplicationError, ports::PluginRegistry},
    domain::{DomainValidator as validator, InlineSteps, OptionMap, Plugin, SourceFile},
    error::BoilerplateResult,
};

/// A resolved pipeline step.
#[derive(Clone)]
pub struct PluginRef {
    pub name: String,
    pub plugin: Arc<dyn Plugin>,
}

impl fmt::Debug for PluginRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PluginRef").field(&self.name).finish()
    }
}

/// The ordered steps applied to every file of one node.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    steps: Vec<PluginRef>,
}

impl Pipeline {
    pub fn new(steps: Vec<PluginRef>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PluginRef] {
        &self.steps
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Apply every step in order. `Ok(None)` means a step dropped the file.
    pub fn run(
        &self,
        file: SourceFile,
        options: &OptionMap,
        node: &str,
    ) -> BoilerplateResult<Option<SourceFile>> {
        let mut current = file;
        for step in &self.steps {
            let path = current.path();
            match step.plugin.apply(current, options) {
                Ok(Some(next)) => current = next,
                Ok(None) => return Ok(None),
                Err(e) => {
                    return Err(ApplicationError::PluginFailed {
                        plugin: step.name.clone(),
                        node: node.to_string(),
                        path,
                        reason: e.to_string(),
                    }
                    .into());
                }
            }
        }
        Ok(Some(current))
    }
}

/// Resolve the pipeline for a node from its effective options.
///
/// Fails with `UnknownPlugin` on the first name that resolves to nothing.
/// Steps named in the `disable` option are left out.
pub fn resolve_pipeline(
    options: &OptionMap,
    node: &str,
    inline: &InlineSteps,
    registry: &dyn PluginRegistry,
) -> BoilerplateResult<Pipeline> {
    let names = validator::pipeline_names(options, node)?;
    let disabled = validator::disabled_names(options, node)?;

    let mut steps = Vec::with_capacity(names.len());
    for name in names {
        if disabled.contains(&name) {
            continue;
        }
        let plugin = match inline.get(&name) {
            Some(plugin) => plugin,
            None => registry
                .lookup(&name)?
                .ok_or_else(|| ApplicationError::UnknownPlugin {
                    name: name.clone(),
                    node: node.to_string(),
                })?,
        };
        steps.push(PluginRef { name, plugin });
    }
    Ok(Pipeline::new(steps))
}
