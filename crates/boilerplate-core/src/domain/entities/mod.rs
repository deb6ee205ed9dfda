pub mod file;
pub mod plugin;
pub mod tree;

pub use file::{OutputFile, SourceFile, SourceHandle};
pub use plugin::{FnPlugin, InlineSteps, Plugin};
pub use tree::{ConfigTree, FileSet, Scaffold, Target};
