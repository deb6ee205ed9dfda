//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `boilerplate-adapters` crate provides implementations.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Plugin, SourceFile, SourceHandle};
use crate::error::BoilerplateResult;

/// Port for reading sources and writing outputs.
///
/// Implemented by:
/// - `boilerplate_adapters::filesystem::LocalFileAccess` (production)
/// - `boilerplate_adapters::filesystem::MemoryFileAccess` (testing)
/// - `boilerplate_adapters::filesystem::DryRunFileAccess` (no writes)
///
/// ## Design Notes
///
/// - Matching a cwd that does not exist yields no files, not an error
/// - `put` creates missing parent directories
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileAccess: Send + Sync {
    /// Files under `cwd` matching `patterns`, sorted by relative path.
    ///
    /// Patterns starting with `!` exclude files. Hidden files are only
    /// matched when `dot` is set or a pattern names them explicitly.
    async fn matches(
        &self,
        cwd: &Path,
        patterns: &[String],
        dot: bool,
    ) -> BoilerplateResult<Vec<SourceHandle>>;

    /// Read a matched file.
    async fn materialize(&self, handle: &SourceHandle) -> BoilerplateResult<SourceFile>;

    /// Write `contents` to `path`, replacing any existing file.
    async fn put(&self, path: &Path, contents: &[u8]) -> BoilerplateResult<()>;
}

/// Port for plugin lookup.
///
/// Implemented by:
/// - `boilerplate_adapters::plugins::InMemoryRegistry` (built-ins + registered)
#[cfg_attr(test, mockall::automock)]
pub trait PluginRegistry: Send + Sync {
    /// Find a plugin by name.
    fn lookup(&self, name: &str) -> BoilerplateResult<Option<Arc<dyn Plugin>>>;

    /// All registered names, in registration order.
    fn names(&self) -> BoilerplateResult<Vec<String>>;
}
