//! Application layer for Boilerplate.
//!
//! This layer contains:
//! - **Services**: Run orchestration (BoilerplateService, pipeline resolution)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer drives the domain layer but contains no
//! configuration rules itself. Those live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{
    BoilerplateService, FileStream, Pipeline, PluginRef, RunSummary, StreamEvent,
    resolve_pipeline,
};

// Re-export port traits (for adapter implementation)
pub use ports::{FileAccess, PluginRegistry};

pub use error::ApplicationError;
