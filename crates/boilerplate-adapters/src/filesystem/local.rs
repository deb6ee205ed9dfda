//! Local filesystem adapter using walkdir and tokio::fs.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use boilerplate_core::{
    application::{ApplicationError, ports::FileAccess},
    domain::{SourceFile, SourceHandle},
    error::{BoilerplateError, BoilerplateResult},
};
use tracing::{debug, trace};
use walkdir::WalkDir;

use super::glob::PatternSet;

/// Production file access on the local disk.
///
/// Relative paths resolve against `root` when one is set, otherwise against
/// the process working directory.
#[derive(Debug, Clone, Default)]
pub struct LocalFileAccess {
    root: Option<PathBuf>,
}

impl LocalFileAccess {
    /// Create a new local file access adapter.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Resolve relative source and destination paths against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl FileAccess for LocalFileAccess {
    async fn matches(
        &self,
        cwd: &Path,
        patterns: &[String],
        dot: bool,
    ) -> BoilerplateResult<Vec<SourceHandle>> {
        let set = PatternSet::new(patterns, dot)?;
        let base = self.resolve(cwd);
        let handle_cwd = cwd.to_path_buf();

        let relatives = tokio::task::spawn_blocking(move || walk(&base, &set))
            .await
            .map_err(|e| BoilerplateError::internal(format!("source walk panicked: {e}")))??;

        debug!(cwd = %cwd.display(), matched = relatives.len(), "Matched local sources");
        Ok(relatives
            .into_iter()
            .map(|relative| SourceHandle::new(handle_cwd.clone(), relative))
            .collect())
    }

    async fn materialize(&self, handle: &SourceHandle) -> BoilerplateResult<SourceFile> {
        let path = self.resolve(&handle.path());
        let contents = tokio::fs::read(&path)
            .await
            .map_err(|e| map_io_error(&path, e, "read file"))?;
        Ok(SourceFile::new(handle, contents))
    }

    async fn put(&self, path: &Path, contents: &[u8]) -> BoilerplateResult<()> {
        let path = self.resolve(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io_error(parent, e, "create directory"))?;
        }
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| map_io_error(&path, e, "write file"))?;
        trace!(path = %path.display(), bytes = contents.len(), "Wrote file");
        Ok(())
    }
}

/// Walk `base` and collect the relative paths of matching files, sorted.
///
/// A missing `base` yields no files.
fn walk(base: &Path, set: &PatternSet) -> BoilerplateResult<Vec<PathBuf>> {
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let mut matched = Vec::new();
    for entry in WalkDir::new(base).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(base).to_path_buf();
            ApplicationError::filesystem(path, format!("Failed to walk directory: {e}"))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(base) else {
            continue;
        };
        if set.is_match(relative) {
            matched.push(relative.to_path_buf());
        }
    }
    matched.sort();
    Ok(matched)
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> BoilerplateError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}
