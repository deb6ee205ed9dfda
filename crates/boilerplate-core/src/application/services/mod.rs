//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "run this boilerplate tree".

pub mod boilerplate_service;
pub mod pipeline;
pub mod stream;

pub use boilerplate_service::{BoilerplateService, RunSummary};
pub use pipeline::{Pipeline, PluginRef, resolve_pipeline};
pub use stream::{FileStream, StreamEvent};
