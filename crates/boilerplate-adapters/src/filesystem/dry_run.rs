//! File access wrapper that never writes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use boilerplate_core::{
    application::ports::FileAccess,
    domain::{SourceFile, SourceHandle},
    error::BoilerplateResult,
};
use tracing::info;

/// Reads through to another adapter but only records writes.
#[derive(Clone)]
pub struct DryRunFileAccess {
    inner: Arc<dyn FileAccess>,
    planned: Arc<RwLock<Vec<(PathBuf, usize)>>>,
}

impl DryRunFileAccess {
    pub fn new(inner: Arc<dyn FileAccess>) -> Self {
        Self {
            inner,
            planned: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Writes that would have happened, with their sizes in bytes.
    pub fn planned(&self) -> Vec<(PathBuf, usize)> {
        self.planned.read().map(|p| p.clone()).unwrap_or_default()
    }
}

impl std::fmt::Debug for DryRunFileAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DryRunFileAccess")
            .field("planned", &self.planned())
            .finish()
    }
}

#[async_trait]
impl FileAccess for DryRunFileAccess {
    async fn matches(
        &self,
        cwd: &Path,
        patterns: &[String],
        dot: bool,
    ) -> BoilerplateResult<Vec<SourceHandle>> {
        self.inner.matches(cwd, patterns, dot).await
    }

    async fn materialize(&self, handle: &SourceHandle) -> BoilerplateResult<SourceFile> {
        self.inner.materialize(handle).await
    }

    async fn put(&self, path: &Path, contents: &[u8]) -> BoilerplateResult<()> {
        info!(path = %path.display(), bytes = contents.len(), "Dry run: skipping write");
        if let Ok(mut planned) = self.planned.write() {
            planned.push((path.to_path_buf(), contents.len()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::MemoryFileAccess;

    #[tokio::test]
    async fn reads_pass_through_writes_are_recorded() {
        let memory = MemoryFileAccess::new().with_file("in/a.txt", "a");
        let dry = DryRunFileAccess::new(Arc::new(memory.clone()));

        let handles = dry.matches(Path::new("in"), &["*".to_string()], false).await.unwrap();
        let file = dry.materialize(&handles[0]).await.unwrap();
        dry.put(Path::new("out/a.txt"), &file.contents).await.unwrap();

        assert_eq!(dry.planned(), [(PathBuf::from("out/a.txt"), 1)]);
        assert!(memory.read("out/a.txt").is_none());
    }
}
