//! The transform-step abstraction applied by pipelines.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::domain::{entities::file::SourceFile, error::DomainError, options::OptionMap};

/// A single named transform step.
///
/// Plugins receive one file at a time together with the effective options of
/// the node being processed. Returning `Ok(None)` drops the file.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn apply(
        &self,
        file: SourceFile,
        options: &OptionMap,
    ) -> Result<Option<SourceFile>, DomainError>;
}

type TransformFn =
    dyn Fn(SourceFile, &OptionMap) -> Result<Option<SourceFile>, DomainError> + Send + Sync;

/// Adapter turning a closure into a [`Plugin`].
#[derive(Clone)]
pub struct FnPlugin {
    name: String,
    f: Arc<TransformFn>,
}

impl FnPlugin {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(SourceFile, &OptionMap) -> Result<Option<SourceFile>, DomainError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    /// Plugin that appends `suffix` to every file's contents.
    pub fn append(name: impl Into<String>, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        Self::new(name, move |mut file, _| {
            file.contents.extend_from_slice(suffix.as_bytes());
            Ok(Some(file))
        })
    }

    /// Plugin that prepends `prefix` to every file's contents.
    pub fn prepend(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self::new(name, move |mut file, _| {
            let mut contents = prefix.clone().into_bytes();
            contents.append(&mut file.contents);
            file.contents = contents;
            Ok(Some(file))
        })
    }
}

impl Plugin for FnPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        file: SourceFile,
        options: &OptionMap,
    ) -> Result<Option<SourceFile>, DomainError> {
        (self.f)(file, options)
    }
}

impl fmt::Debug for FnPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPlugin").field("name", &self.name).finish()
    }
}

/// Transforms declared inline in a configuration's `pipeline` lists.
///
/// The expander stores each one under a generated name and writes that name
/// into the option map, so options stay plain JSON.
#[derive(Clone, Default)]
pub struct InlineSteps(IndexMap<String, Arc<dyn Plugin>>);

impl InlineSteps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, plugin: Arc<dyn Plugin>) {
        self.0.insert(name.into(), plugin);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.0.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Debug for InlineSteps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.keys()).finish()
    }
}
