//! Infrastructure adapters for Boilerplate.
//!
//! This crate implements the ports defined in
//! `boilerplate-core::application::ports`. It contains all external
//! dependencies and I/O operations.

pub mod config_loader;
pub mod filesystem;
pub mod plugins;

// Re-export commonly used adapters
pub use config_loader::{ConfigFormat, ConfigLoader};
pub use filesystem::{DryRunFileAccess, LocalFileAccess, MemoryFileAccess, PatternSet};
pub use plugins::InMemoryRegistry;
