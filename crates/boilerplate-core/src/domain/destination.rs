//! Mapping matched source paths onto destination paths.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::domain::{
    error::DomainError,
    options::{OptionMap, bool_option, kind_of, string_option},
};

/// How one file set lays out its outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationRule {
    pub dest: PathBuf,
    pub flatten: bool,
    /// Replacement extension, always stored with a leading dot.
    pub ext: Option<String>,
}

impl DestinationRule {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            flatten: false,
            ext: None,
        }
    }

    /// Build a rule from a file set's destination and the node's options
    /// (`destBase`, `flatten`, `ext`).
    pub fn from_options(dest: &Path, options: &OptionMap, node: &str) -> Result<Self, DomainError> {
        let dest = match string_option(options, "destBase") {
            Some(base) => Path::new(base).join(dest),
            None => dest.to_path_buf(),
        };

        let ext = match options.get("ext") {
            None | Some(Value::Null) => None,
            Some(Value::String(ext)) if ext.is_empty() => None,
            Some(Value::String(ext)) if ext.starts_with('.') => Some(ext.clone()),
            Some(Value::String(ext)) => Some(format!(".{ext}")),
            Some(other) => {
                return Err(DomainError::InvalidOption {
                    path: node.into(),
                    key: "ext".into(),
                    reason: format!("expected a string, found {}", kind_of(other)),
                });
            }
        };

        Ok(Self {
            dest,
            flatten: bool_option(options, "flatten"),
            ext,
        })
    }

    /// Destination for a file at `relative` (relative to its `cwd`).
    pub fn apply(&self, relative: &Path) -> PathBuf {
        let mut rel = if self.flatten {
            relative
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| relative.to_path_buf())
        } else {
            relative.to_path_buf()
        };

        if let Some(ext) = &self.ext {
            let stem = rel
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            rel.set_file_name(format!("{stem}{ext}"));
        }

        self.dest.join(rel)
    }
}
