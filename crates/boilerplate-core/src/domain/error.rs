// ============================================================================
// domain/error.rs - EXPANSION AND VALIDATION ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (they fan out to several stream consumers)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Schema Errors (the raw configuration has an unusable shape)
    // ========================================================================
    #[error("'{path}' is neither a target nor a scaffold (found {found})")]
    UnrecognizedShape { path: String, found: String },

    #[error("'{name}' under '{parent}' is not a usable node name: it {reason}")]
    InvalidName {
        parent: String,
        name: String,
        reason: String,
    },

    #[error("config factory for '{path}' must return a mapping")]
    FactoryNotMapping { path: String },

    #[error("'{path}' has no files and no nested targets or scaffolds")]
    EmptyNode { path: String },

    #[error("target '{path}' has no source patterns")]
    MissingSource { path: String },

    #[error("target '{path}' has no destination")]
    MissingDestination { path: String },

    #[error("invalid option '{key}' on '{path}': {reason}")]
    InvalidOption {
        path: String,
        key: String,
        reason: String,
    },

    // ========================================================================
    // Invalid Config (not a well-formed expanded tree)
    // ========================================================================
    #[error("expected an expanded boilerplate tree: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Transform Failures
    // ========================================================================
    #[error("plugin '{plugin}' failed on {path}: {reason}")]
    TransformFailed {
        plugin: String,
        path: String,
        reason: String,
    },
}

impl DomainError {
    /// Shorthand used by plugin implementations.
    pub fn transform(
        plugin: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::TransformFailed {
            plugin: plugin.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// `true` for the errors raised while classifying raw configuration.
    pub fn is_schema(&self) -> bool {
        !matches!(
            self,
            Self::InvalidConfig(_) | Self::TransformFailed { .. }
        )
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UnrecognizedShape { path, .. } => vec![
                format!("Check the value under '{}'", path),
                "Targets need a `src` or `files` key; scaffolds are nested mappings".into(),
            ],
            Self::InvalidName { .. } => vec![
                "Node names must be non-empty and must not contain '.'".into(),
                "Nest a mapping instead of writing a dotted key".into(),
            ],
            Self::FactoryNotMapping { path } => vec![format!(
                "The config function for '{}' returned something other than a mapping",
                path
            )],
            Self::EmptyNode { path } => vec![
                format!("'{}' is an empty mapping", path),
                "Add `src`/`dest` to make it a target, or nest targets under it".into(),
            ],
            Self::MissingSource { path } => vec![
                format!("Give '{}' a non-empty `src` pattern", path),
                "Example: src = [\"templates/*.md\"]".into(),
            ],
            Self::MissingDestination { path } => vec![
                format!("Give '{}' a `dest`, or set `dest` in an enclosing `options`", path),
            ],
            Self::InvalidOption { key, .. } if key == "pipeline" => vec![
                "`pipeline` must be a list of plugin names".into(),
                "Try: boilerplate plugins to see registered names".into(),
            ],
            Self::InvalidConfig(_) => vec![
                "Expand the configuration before running it".into(),
                "Saved plans must come from `boilerplate plan --format json`".into(),
            ],
            Self::TransformFailed { plugin, .. } => vec![format!(
                "Check the options passed to plugin '{}'",
                plugin
            )],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig(_) => ErrorCategory::InvalidConfig,
            Self::TransformFailed { .. } => ErrorCategory::Transform,
            _ => ErrorCategory::Schema,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Schema,
    InvalidConfig,
    Transform,
}
