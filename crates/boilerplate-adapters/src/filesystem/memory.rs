//! In-memory file access adapter for testing.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use boilerplate_core::{
    application::{ApplicationError, ports::FileAccess},
    domain::{SourceFile, SourceHandle},
    error::BoilerplateResult,
};

use super::glob::PatternSet;

/// In-memory file store for testing.
///
/// Sources and outputs share one map, so a later target can read what an
/// earlier one wrote. A `cwd` of `.` addresses paths stored without a prefix.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileAccess {
    inner: Arc<RwLock<MemoryFileAccessInner>>,
}

#[derive(Debug, Default)]
struct MemoryFileAccessInner {
    files: BTreeMap<PathBuf, Vec<u8>>,
    written: Vec<PathBuf>,
}

impl MemoryFileAccess {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Add or replace a file (testing helper).
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        if let Ok(mut inner) = self.inner.write() {
            inner.files.insert(path.into(), contents.into());
        }
    }

    /// Read a file's contents (testing helper).
    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let inner = self.inner.read().ok()?;
        inner.files.get(path.as_ref()).cloned()
    }

    pub fn read_string(&self, path: impl AsRef<Path>) -> Option<String> {
        self.read(path).and_then(|bytes| String::from_utf8(bytes).ok())
    }

    /// Paths passed to `put`, in call order.
    pub fn written(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.written.clone())
            .unwrap_or_default()
    }

    /// List all files, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn lock_error(path: &Path) -> ApplicationError {
    ApplicationError::filesystem(path, "memory store lock poisoned")
}

#[async_trait]
impl FileAccess for MemoryFileAccess {
    async fn matches(
        &self,
        cwd: &Path,
        patterns: &[String],
        dot: bool,
    ) -> BoilerplateResult<Vec<SourceHandle>> {
        let set = PatternSet::new(patterns, dot)?;
        let inner = self.inner.read().map_err(|_| lock_error(cwd))?;

        let mut relatives: Vec<PathBuf> = inner
            .files
            .keys()
            .filter_map(|path| {
                if cwd == Path::new(".") {
                    Some(path.as_path())
                } else {
                    path.strip_prefix(cwd).ok()
                }
            })
            .filter(|relative| set.is_match(relative))
            .map(Path::to_path_buf)
            .collect();
        relatives.sort();

        Ok(relatives
            .into_iter()
            .map(|relative| SourceHandle::new(cwd, relative))
            .collect())
    }

    async fn materialize(&self, handle: &SourceHandle) -> BoilerplateResult<SourceFile> {
        let key = if handle.cwd == Path::new(".") {
            handle.relative.clone()
        } else {
            handle.path()
        };
        let inner = self.inner.read().map_err(|_| lock_error(&key))?;
        let contents = inner
            .files
            .get(&key)
            .cloned()
            .ok_or_else(|| ApplicationError::filesystem(&key, "No such file"))?;
        Ok(SourceFile::new(handle, contents))
    }

    async fn put(&self, path: &Path, contents: &[u8]) -> BoilerplateResult<()> {
        let mut inner = self.inner.write().map_err(|_| lock_error(path))?;
        inner.files.insert(path.to_path_buf(), contents.to_vec());
        inner.written.push(path.to_path_buf());
        Ok(())
    }
}
