//! In-memory plugin registry with the built-in plugins.

use std::sync::{Arc, RwLock};

use boilerplate_core::{
    application::{ApplicationError, ports::PluginRegistry},
    domain::{DomainError, FnPlugin, OptionMap, Plugin, SourceFile},
    error::BoilerplateResult,
};
use indexmap::IndexMap;
use tracing::debug;

use super::builtin;

/// Thread-safe plugin registry keyed by name.
///
/// Registering a name twice replaces the earlier plugin in place.
#[derive(Clone)]
pub struct InMemoryRegistry {
    inner: Arc<RwLock<IndexMap<String, Arc<dyn Plugin>>>>,
}

impl InMemoryRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Create a registry with the built-in plugins loaded.
    pub fn with_builtin() -> BoilerplateResult<Self> {
        let registry = Self::new();
        for plugin in builtin::all_plugins() {
            registry.register_arc(plugin)?;
        }
        Ok(registry)
    }

    pub fn register(&self, plugin: impl Plugin + 'static) -> BoilerplateResult<()> {
        self.register_arc(Arc::new(plugin))
    }

    /// Register a closure as a plugin.
    pub fn register_fn<F>(&self, name: &str, f: F) -> BoilerplateResult<()>
    where
        F: Fn(SourceFile, &OptionMap) -> Result<Option<SourceFile>, DomainError>
            + Send
            + Sync
            + 'static,
    {
        self.register(FnPlugin::new(name, f))
    }

    pub fn register_arc(&self, plugin: Arc<dyn Plugin>) -> BoilerplateResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::RegistryLockError)?;
        debug!(plugin = plugin.name(), "Registering plugin");
        inner.insert(plugin.name().to_string(), plugin);
        Ok(())
    }

    /// Remove a plugin, returning whether it was registered.
    pub fn unregister(&self, name: &str) -> BoilerplateResult<bool> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::RegistryLockError)?;
        Ok(inner.shift_remove(name).is_some())
    }

    /// Get the number of plugins.
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.len()).unwrap_or(0)
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self.names().unwrap_or_default();
        f.debug_struct("InMemoryRegistry").field("plugins", &names).finish()
    }
}

impl PluginRegistry for InMemoryRegistry {
    fn lookup(&self, name: &str) -> BoilerplateResult<Option<Arc<dyn Plugin>>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::RegistryLockError)?;
        Ok(inner.get(name).cloned())
    }

    fn names(&self) -> BoilerplateResult<Vec<String>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::RegistryLockError)?;
        Ok(inner.keys().cloned().collect())
    }
}
