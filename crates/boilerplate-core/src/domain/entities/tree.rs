//! The expanded configuration tree.
//!
//! A [`ConfigTree`] is the canonical form of a boilerplate configuration:
//! a root owning ordered maps of [`Scaffold`]s and [`Target`]s, scaffolds
//! nesting recursively. Option inheritance is resolved during expansion, so
//! every node carries both the options it declared and its effective options.
//!
//! Trees are immutable once built. They serialise to JSON so an expanded plan
//! can be saved and executed later; a deserialised tree must pass
//! [`ConfigTree::validate`] before it runs.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::{
    entities::plugin::InlineSteps,
    error::DomainError,
    options::{OptionMap, string_option},
};

// ── Root ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigTree {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) own_options: OptionMap,
    #[serde(default)]
    pub(crate) effective_options: OptionMap,
    #[serde(default)]
    pub(crate) scaffolds: IndexMap<String, Scaffold>,
    #[serde(default)]
    pub(crate) targets: IndexMap<String, Target>,
    #[serde(skip)]
    pub(crate) inline: InlineSteps,
}

impl ConfigTree {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn own_options(&self) -> &OptionMap {
        &self.own_options
    }
    pub fn options(&self) -> &OptionMap {
        &self.effective_options
    }
    pub fn scaffolds(&self) -> &IndexMap<String, Scaffold> {
        &self.scaffolds
    }
    pub fn targets(&self) -> &IndexMap<String, Target> {
        &self.targets
    }
    pub fn inline_steps(&self) -> &InlineSteps {
        &self.inline
    }

    /// Total number of targets at every depth.
    pub fn target_count(&self) -> usize {
        self.targets.len() + self.scaffolds.values().map(Scaffold::target_count).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.scaffolds.is_empty() && self.targets.is_empty()
    }

    /// Find a node's target by dotted path, e.g. `site.css`.
    pub fn find_target(&self, path: &str) -> Option<&Target> {
        let mut segments: Vec<&str> = path.split('.').collect();
        let leaf = segments.pop()?;
        if segments.is_empty() {
            return self.targets.get(leaf);
        }
        let mut scaffold = self.scaffolds.get(segments[0])?;
        for segment in &segments[1..] {
            scaffold = scaffold.scaffolds.get(*segment)?;
        }
        scaffold.targets.get(leaf)
    }

    /// Check the invariants every expanded tree satisfies.
    ///
    /// Trees produced by the expander always pass; this guards trees that
    /// were deserialised or assembled elsewhere.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidConfig("root has no name".into()));
        }
        validate_children(&self.scaffolds, &self.targets, "")
    }
}

fn validate_children(
    scaffolds: &IndexMap<String, Scaffold>,
    targets: &IndexMap<String, Target>,
    parent: &str,
) -> Result<(), DomainError> {
    for (key, scaffold) in scaffolds {
        check_name(key, &scaffold.name, &scaffold.path, parent)?;
        if scaffold.scaffolds.is_empty() && scaffold.targets.is_empty() {
            return Err(DomainError::InvalidConfig(format!(
                "scaffold '{}' is empty",
                scaffold.path
            )));
        }
        validate_children(&scaffold.scaffolds, &scaffold.targets, &scaffold.path)?;
    }
    for (key, target) in targets {
        check_name(key, &target.name, &target.path, parent)?;
        target.validate()?;
    }
    Ok(())
}

fn check_name(key: &str, name: &str, path: &str, parent: &str) -> Result<(), DomainError> {
    if let Some(reason) = name_problem(key) {
        return Err(DomainError::InvalidConfig(format!(
            "node '{path}' is registered under key '{key}', which {reason}"
        )));
    }
    if key != name {
        return Err(DomainError::InvalidConfig(format!(
            "node '{path}' is registered under key '{key}'"
        )));
    }
    if path != join_path(parent, name) {
        return Err(DomainError::InvalidConfig(format!(
            "node '{name}' has path '{path}', expected '{}'",
            join_path(parent, name)
        )));
    }
    Ok(())
}

/// Why `name` cannot name a node, if it cannot. Paths are joined with `.`,
/// so a dotted name would collide with a nested node.
pub(crate) fn name_problem(name: &str) -> Option<&'static str> {
    if name.trim().is_empty() {
        Some("is empty")
    } else if name.contains('.') {
        Some("contains '.'")
    } else {
        None
    }
}

/// Dotted node path used in logs, errors and inline step names.
pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

// ── Scaffold ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaffold {
    pub(crate) name: String,
    pub(crate) path: String,
    #[serde(default)]
    pub(crate) own_options: OptionMap,
    #[serde(default)]
    pub(crate) effective_options: OptionMap,
    #[serde(default)]
    pub(crate) scaffolds: IndexMap<String, Scaffold>,
    #[serde(default)]
    pub(crate) targets: IndexMap<String, Target>,
}

impl Scaffold {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn path(&self) -> &str {
        &self.path
    }
    pub fn own_options(&self) -> &OptionMap {
        &self.own_options
    }
    pub fn options(&self) -> &OptionMap {
        &self.effective_options
    }
    pub fn scaffolds(&self) -> &IndexMap<String, Scaffold> {
        &self.scaffolds
    }
    pub fn targets(&self) -> &IndexMap<String, Target> {
        &self.targets
    }

    pub fn target_count(&self) -> usize {
        self.targets.len() + self.scaffolds.values().map(Scaffold::target_count).sum::<usize>()
    }
}

// ── Target ────────────────────────────────────────────────────────────────────

/// A leaf unit of work: one or more file sets copied through a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub(crate) name: String,
    pub(crate) path: String,
    #[serde(default)]
    pub(crate) own_options: OptionMap,
    #[serde(default)]
    pub(crate) effective_options: OptionMap,
    pub(crate) files: Vec<FileSet>,
}

impl Target {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn path(&self) -> &str {
        &self.path
    }
    pub fn own_options(&self) -> &OptionMap {
        &self.own_options
    }
    pub fn options(&self) -> &OptionMap {
        &self.effective_options
    }
    pub fn files(&self) -> &[FileSet] {
        &self.files
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.files.is_empty() {
            return Err(DomainError::InvalidConfig(format!(
                "target '{}' has no file sets",
                self.path
            )));
        }
        for set in &self.files {
            if set.src.is_empty() || set.src.iter().any(|p| p.trim().is_empty()) {
                return Err(DomainError::InvalidConfig(format!(
                    "target '{}' has an empty source pattern",
                    self.path
                )));
            }
            if set.dest_with(&self.effective_options).is_none() {
                return Err(DomainError::InvalidConfig(format!(
                    "target '{}' has no destination",
                    self.path
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        for set in &self.files {
            write!(f, " [{}]", set.src.join(", "))?;
            if let Some(dest) = &set.dest {
                write!(f, " -> {}", dest.display())?;
            }
        }
        Ok(())
    }
}

/// One `src` → `dest` mapping inside a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSet {
    pub src: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl FileSet {
    pub fn new(src: Vec<String>) -> Self {
        Self {
            src,
            dest: None,
            cwd: None,
        }
    }

    pub fn with_dest(mut self, dest: impl Into<PathBuf>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Destination, falling back to the `dest` option.
    pub fn dest_with(&self, options: &OptionMap) -> Option<PathBuf> {
        self.dest
            .clone()
            .or_else(|| string_option(options, "dest").map(PathBuf::from))
    }

    /// Base directory, falling back to the `cwd` option and then `.`.
    pub fn cwd_with(&self, options: &OptionMap) -> PathBuf {
        self.cwd
            .clone()
            .or_else(|| string_option(options, "cwd").map(PathBuf::from))
            .unwrap_or_else(|| Path::new(".").to_path_buf())
    }
}
