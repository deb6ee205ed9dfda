//! Classification of raw configuration values.
//!
//! The decision is total: a value that declares a file selector is a target,
//! any other mapping is a scaffold, and everything else is rejected.

use crate::domain::raw::RawNode;

/// Keys with a fixed meaning on every mapping node.
pub const RESERVED_KEYS: &[&str] = &["options", "name"];

/// Keys that mark a mapping as a target descriptor.
pub const FILE_SELECTOR_KEYS: &[&str] = &["src", "files"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Target,
    Scaffold,
}

/// Decides what a raw child value becomes in the expanded tree.
///
/// The expander takes one as a constructor parameter, so callers can extend
/// the schema without touching global state.
pub trait Classifier: Send + Sync {
    /// `None` rejects the value.
    fn classify(&self, value: &RawNode) -> Option<NodeKind>;
}

/// The default rule: file selector ⇒ target; else mapping ⇒ scaffold.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeClassifier;

impl Classifier for ShapeClassifier {
    fn classify(&self, value: &RawNode) -> Option<NodeKind> {
        if FILE_SELECTOR_KEYS.iter().any(|key| value.has_key(key)) {
            Some(NodeKind::Target)
        } else if value.is_mapping() {
            Some(NodeKind::Scaffold)
        } else {
            None
        }
    }
}
