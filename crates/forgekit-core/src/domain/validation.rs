use crate::domain::{entities::ProjectConfig, error::DomainError};

/// npm refuses package names longer than this.
pub const MAX_PROJECT_NAME_LEN: usize = 214;

/// Centralized domain validation.
///
/// All validation logic lives here, not scattered across entities.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_config(config: &ProjectConfig) -> Result<(), DomainError> {
        config.validate()
    }

    /// Project names double as npm package names and directory names:
    /// lowercase ASCII letters, digits and hyphens, no leading or trailing
    /// hyphen.
    pub fn validate_project_name(name: &str) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidProjectName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        if name.len() > MAX_PROJECT_NAME_LEN {
            return Err(invalid("name is longer than 214 characters"));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(invalid(&format!("character '{c}' is not allowed")));
        }
        if name.starts_with('-') || name.ends_with('-') {
            return Err(invalid("name cannot start or end with a hyphen"));
        }
        Ok(())
    }
}
