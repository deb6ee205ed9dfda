use std::path::{Path, PathBuf};

use serde::Serialize;

/// A matched source file, not yet read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceHandle {
    pub cwd: PathBuf,
    /// Path relative to `cwd`; drives the destination layout.
    pub relative: PathBuf,
}

impl SourceHandle {
    pub fn new(cwd: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            relative: relative.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.cwd.join(&self.relative)
    }
}

/// A source file with its contents loaded, as seen by pipeline plugins.
///
/// Plugins may rewrite `relative` to rename the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub cwd: PathBuf,
    pub relative: PathBuf,
    pub contents: Vec<u8>,
}

impl SourceFile {
    pub fn new(handle: &SourceHandle, contents: Vec<u8>) -> Self {
        Self {
            cwd: handle.cwd.clone(),
            relative: handle.relative.clone(),
            contents,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.cwd.join(&self.relative)
    }

    /// Contents as UTF-8, if they are text.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.contents).ok()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.contents = text.into().into_bytes();
    }
}

/// A file written by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    /// Dotted path of the target that produced it.
    pub node: String,
    pub source: PathBuf,
    pub dest: PathBuf,
    #[serde(skip)]
    pub contents: Vec<u8>,
}

impl OutputFile {
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.contents).ok()
    }
}
