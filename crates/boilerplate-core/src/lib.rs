//! Boilerplate Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for Boilerplate,
//! a declarative file-scaffolding engine: nested configuration is expanded
//! into a tree of scaffolds and targets, and every target copies its
//! matched files through a pipeline of named transform steps.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         boilerplate-cli (CLI)           │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  (BoilerplateService, resolve_pipeline) │
//! │      Series and stream execution        │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │    (Driven: FileAccess, Registry)       │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │   boilerplate-adapters (Infrastructure) │
//! │ (LocalFileAccess, InMemoryRegistry, ..) │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │       Domain Layer (Pure Logic)         │
//! │ (RawNode, Expander, ConfigTree, Plugin) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use boilerplate_core::prelude::*;
//! use serde_json::json;
//!
//! # async fn demo(files: Arc<dyn FileAccess>, plugins: Arc<dyn PluginRegistry>) -> BoilerplateResult<()> {
//! let service = BoilerplateService::new(files, plugins);
//!
//! // 1. Expand raw configuration
//! let tree = service.expand(json!({
//!     "options": {"pipeline": ["eol"]},
//!     "docs": {"src": "*.md", "dest": "out/docs", "cwd": "templates"}
//! }))?;
//!
//! // 2. Run it
//! let summary = service.run_series(&tree, &OptionMap::new()).await?;
//! println!("wrote {} files", summary.files.len());
//! # Ok(())
//! # }
//! ```

// Re-export domain layer (stable, well-defined API)
pub mod domain;

// Re-export application layer (orchestration logic)
pub mod application;

// Re-export error types
pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        BoilerplateService, FileStream, RunSummary, StreamEvent,
        ports::{FileAccess, PluginRegistry},
    };
    pub use crate::domain::{
        ConfigTree, Expander, FileSet, FnPlugin, OptionMap, OutputFile, Plugin, RawMap, RawNode,
        Scaffold, SourceFile, SourceHandle, Target,
    };
    pub use crate::error::{BoilerplateError, BoilerplateResult, ErrorKind};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
