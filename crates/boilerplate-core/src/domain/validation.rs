use crate::domain::{
    entities::tree::{ConfigTree, Target},
    error::DomainError,
    options::{OptionMap, string_list_option},
};

/// Centralized domain validation.
///
/// All validation logic lives here, not scattered across entities.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_tree(tree: &ConfigTree) -> Result<(), DomainError> {
        tree.validate()
    }

    pub fn validate_target(target: &Target) -> Result<(), DomainError> {
        target.validate()
    }

    /// The `pipeline` option as a list of step names.
    pub fn pipeline_names(options: &OptionMap, node: &str) -> Result<Vec<String>, DomainError> {
        Self::name_list(options, "pipeline", node)
    }

    /// The `disable` option as a list of step names.
    pub fn disabled_names(options: &OptionMap, node: &str) -> Result<Vec<String>, DomainError> {
        Self::name_list(options, "disable", node)
    }

    fn name_list(options: &OptionMap, key: &str, node: &str) -> Result<Vec<String>, DomainError> {
        let names = string_list_option(options, key).map_err(|reason| DomainError::InvalidOption {
            path: node.into(),
            key: key.into(),
            reason,
        })?;
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(DomainError::InvalidOption {
                path: node.into(),
                key: key.into(),
                reason: "step names cannot be empty".into(),
            });
        }
        Ok(names)
    }
}
