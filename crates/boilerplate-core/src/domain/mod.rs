// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Boilerplate.
//!
//! This module contains pure configuration logic: raw input, the expanded
//! tree, option layering, classification and destination mapping.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **No tracing**: Logging belongs to the application layer
//! - **Immutable trees**: Expanded trees are never mutated after expansion
//!
// Public API - what the world sees
pub mod classify;
pub mod destination;
pub mod entities;
pub mod error;
pub mod expander;
pub mod options;
pub mod raw;

// Private implementation details - not visible outside domain
mod validation;

// Re-exports for convenience
pub use classify::{Classifier, NodeKind, ShapeClassifier};
pub use destination::DestinationRule;
pub use entities::{
    file::{OutputFile, SourceFile, SourceHandle},
    plugin::{FnPlugin, InlineSteps, Plugin},
    tree::{ConfigTree, FileSet, Scaffold, Target},
};
pub use error::{DomainError, ErrorCategory};
pub use expander::{DEFAULT_ROOT_NAME, Expander};
pub use options::{OptionMap, merge};
pub use raw::{ConfigFactory, RawMap, RawNode};
pub use validation::DomainValidator;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ========================================================================
    // Tree Round-Trip Tests
    // ========================================================================

    #[test]
    fn expanded_tree_survives_json() {
        let tree = Expander::new()
            .expand(json!({
                "name": "site",
                "options": {"pipeline": ["eol"]},
                "assets": {"css": {"src": ["*.css"], "dest": "css", "cwd": "tpl"}},
                "readme": {"src": "README.md", "dest": "."}
            }))
            .unwrap();

        let text = serde_json::to_string(&tree).unwrap();
        let back: ConfigTree = serde_json::from_str(&text).unwrap();

        assert!(DomainValidator::validate_tree(&back).is_ok());
        assert_eq!(back.name(), "site");
        assert_eq!(back.target_count(), 2);
        assert_eq!(
            back.find_target("assets.css").unwrap().options()["pipeline"],
            json!(["eol"])
        );
    }

    #[test]
    fn hand_edited_tree_fails_validation() {
        let back: ConfigTree = serde_json::from_value(json!({
            "name": "broken",
            "targets": {"t": {"name": "t", "path": "t", "files": []}}
        }))
        .unwrap();
        let err = DomainValidator::validate_tree(&back).unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfig(_)));
        assert_eq!(err.category(), ErrorCategory::InvalidConfig);
    }

    #[test]
    fn mismatched_path_fails_validation() {
        let back: ConfigTree = serde_json::from_value(json!({
            "name": "broken",
            "scaffolds": {"site": {"name": "site", "path": "site", "targets": {
                "css": {"name": "css", "path": "css", "files": [{"src": ["*"], "dest": "d"}]}
            }}}
        }))
        .unwrap();
        assert!(back.validate().is_err());
    }

    #[test]
    fn dotted_key_in_saved_tree_fails_validation() {
        let back: ConfigTree = serde_json::from_value(json!({
            "name": "broken",
            "targets": {"a.b": {"name": "a.b", "path": "a.b", "files": [{"src": ["*"], "dest": "d"}]}}
        }))
        .unwrap();
        let err = back.validate().unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfig(ref msg) if msg.contains("contains '.'")));
    }

    // ========================================================================
    // Validator Tests
    // ========================================================================

    #[test]
    fn pipeline_names_reads_lists() {
        let opts = json!({"pipeline": ["a", "b"]}).as_object().cloned().unwrap();
        assert_eq!(DomainValidator::pipeline_names(&opts, "t").unwrap(), ["a", "b"]);
        assert!(DomainValidator::pipeline_names(&OptionMap::new(), "t").unwrap().is_empty());
    }

    #[test]
    fn pipeline_must_be_names() {
        let opts = json!({"pipeline": {"a": 1}}).as_object().cloned().unwrap();
        let err = DomainValidator::pipeline_names(&opts, "t").unwrap_err();
        assert!(matches!(err, DomainError::InvalidOption { ref key, .. } if key == "pipeline"));
        assert!(err.is_schema());
    }

    #[test]
    fn plugin_can_drop_files() {
        let drop_all = FnPlugin::new("drop", |_, _| Ok(None));
        let file = SourceFile::new(&SourceHandle::new("in", "a.txt"), b"x".to_vec());
        assert!(drop_all.apply(file, &OptionMap::new()).unwrap().is_none());
    }
}
