//! Application layer errors.
//!
//! These errors represent failures while executing an expanded tree, not
//! problems with its shape. Shape errors are `DomainError` from
//! `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during execution.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// A pipeline step name resolved to nothing.
    #[error("Unknown plugin '{name}' in pipeline of '{node}'")]
    UnknownPlugin { name: String, node: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// A pipeline step returned an error.
    #[error("Plugin '{plugin}' failed on {path} in '{node}': {reason}")]
    PluginFailed {
        plugin: String,
        node: String,
        path: PathBuf,
        reason: String,
    },

    /// The run was cancelled by the caller before this node finished.
    #[error("Run cancelled before '{node}' finished")]
    Cancelled { node: String },

    /// Plugin registry access failed (lock poisoned, etc.).
    #[error("Plugin registry error")]
    RegistryLockError,
}

impl ApplicationError {
    pub fn filesystem(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FilesystemError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UnknownPlugin { name, .. } => vec![
                format!("No plugin named '{}' is registered", name),
                "Try: boilerplate plugins to see available plugins".into(),
                "Check the spelling in the `pipeline` option".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that the path exists and you have permissions".into(),
            ],
            Self::PluginFailed { plugin, .. } => vec![
                format!("Check the options passed to plugin '{}'", plugin),
                "Run with -vv to see which file was being processed".into(),
            ],
            Self::Cancelled { .. } => vec!["Files written before cancellation were kept".into()],
            Self::RegistryLockError => vec![
                "The plugin registry is locked".into(),
                "Try again in a moment".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownPlugin { .. } => ErrorCategory::NotFound,
            Self::FilesystemError { .. } => ErrorCategory::Io,
            Self::PluginFailed { .. } => ErrorCategory::Plugin,
            Self::Cancelled { .. } | Self::RegistryLockError => ErrorCategory::Internal,
        }
    }
}
