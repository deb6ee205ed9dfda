//! File access adapters.

mod dry_run;
mod glob;
mod local;
mod memory;

pub use dry_run::DryRunFileAccess;
pub use glob::PatternSet;
pub use local::LocalFileAccess;
pub use memory::MemoryFileAccess;
