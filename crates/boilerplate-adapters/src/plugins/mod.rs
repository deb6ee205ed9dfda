//! Plugin registry adapters and built-in transform steps.

pub mod builtin;
mod registry;

pub use registry::InMemoryRegistry;
