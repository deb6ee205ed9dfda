//! Unified error handling for Boilerplate Core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, with rich context and user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for Boilerplate Core operations.
///
/// Cloneable so one error can be both logged and delivered on a stream.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoilerplateError {
    /// Errors from the domain layer (expansion and tree validation).
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (execution failures).
    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

/// What went wrong, independent of which layer raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The raw configuration has an unusable shape.
    Schema,
    /// A tree handed to the executor is not a well-formed expanded tree.
    InvalidConfig,
    UnknownPlugin,
    Io,
    Plugin,
    Other,
}

impl BoilerplateError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(DomainError::InvalidConfig(_)) => ErrorKind::InvalidConfig,
            Self::Domain(DomainError::TransformFailed { .. }) => ErrorKind::Plugin,
            Self::Domain(_) => ErrorKind::Schema,
            Self::Application(ApplicationError::UnknownPlugin { .. }) => ErrorKind::UnknownPlugin,
            Self::Application(ApplicationError::FilesystemError { .. }) => ErrorKind::Io,
            Self::Application(ApplicationError::PluginFailed { .. }) => ErrorKind::Plugin,
            Self::Application(_) | Self::Configuration { .. } | Self::Internal { .. } => {
                ErrorKind::Other
            }
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {}", message),
                "Check your setup and try again".into(),
            ],
            Self::Internal { .. } => vec!["This appears to be a bug in Boilerplate".into()],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Schema => ErrorCategory::Validation,
                crate::domain::ErrorCategory::InvalidConfig => ErrorCategory::Validation,
                crate::domain::ErrorCategory::Transform => ErrorCategory::Plugin,
            },
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Io,
    Plugin,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type BoilerplateResult<T> = Result<T, BoilerplateError>;

/// Extension trait for adding context to errors.
pub trait Context<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> BoilerplateResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> BoilerplateResult<T> {
        self.map_err(|e| BoilerplateError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_failure() {
        let schema: BoilerplateError = DomainError::EmptyNode { path: "a".into() }.into();
        assert_eq!(schema.kind(), ErrorKind::Schema);

        let invalid: BoilerplateError = DomainError::InvalidConfig("x".into()).into();
        assert_eq!(invalid.kind(), ErrorKind::InvalidConfig);

        let unknown: BoilerplateError = ApplicationError::UnknownPlugin {
            name: "nope".into(),
            node: "t".into(),
        }
        .into();
        assert_eq!(unknown.kind(), ErrorKind::UnknownPlugin);
        assert_eq!(unknown.category(), ErrorCategory::NotFound);

        let io: BoilerplateError = ApplicationError::filesystem("/x", "denied").into();
        assert_eq!(io.kind(), ErrorKind::Io);
    }

    #[test]
    fn context_wraps_as_internal() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        let err = result.context("reading plan").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(err.to_string().contains("reading plan: boom"));
    }
}
