// ============================================================================
// domain/error.rs - CONFIGURATION & NAMING ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (carried inside generation failures)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    #[error("invalid project name '{name}': {reason}")]
    InvalidProjectName { name: String, reason: String },

    #[error("unknown ORM '{value}'")]
    UnknownOrm { value: String },

    #[error("unknown database '{value}'")]
    UnknownDatabase { value: String },

    #[error("unknown package manager '{value}'")]
    UnknownPackageManager { value: String },

    #[error("Required field missing: {field}")]
    MissingRequiredField { field: &'static str },

    // ========================================================================
    // Compatibility Errors (409-level equivalent)
    // ========================================================================
    #[error("ORM '{orm}' cannot be used with database '{database}': {reason}")]
    IncompatibleSelection {
        orm: String,
        database: String,
        reason: String, // populated from capabilities::validate_orm_database
    },

    // ========================================================================
    // Template naming
    // ========================================================================
    #[error("invalid template identity '{id}': {reason}")]
    InvalidTemplateId { id: String, reason: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidProjectName { .. } => vec![
                "Use lowercase letters, digits, and hyphens".into(),
                "Do not start or end the name with a hyphen".into(),
                "Examples: sample-api, orders-service, api2".into(),
            ],
            Self::UnknownOrm { .. } => vec![
                "Supported ORMs: prisma, drizzle, typeorm".into(),
                "Try: forgekit list".into(),
            ],
            Self::UnknownDatabase { .. } => vec![
                "Supported databases: postgresql, mysql, sqlite, mongodb".into(),
                "Try: forgekit list".into(),
            ],
            Self::UnknownPackageManager { .. } => {
                vec!["Supported package managers: npm, pnpm, yarn".into()]
            }
            Self::IncompatibleSelection { orm, .. } => vec![
                format!("Pick a database that {orm} supports"),
                "Try: forgekit list to see the compatibility table".into(),
            ],
            Self::MissingRequiredField { field } => {
                vec![format!("Provide a value for '{field}'")]
            }
            Self::InvalidTemplateId { .. } => vec![
                "Template identities are forward-slash paths relative to the template root".into(),
                "This is likely a bug in a custom template tree".into(),
            ],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidProjectName { .. }
            | Self::UnknownOrm { .. }
            | Self::UnknownDatabase { .. }
            | Self::UnknownPackageManager { .. }
            | Self::MissingRequiredField { .. } => ErrorCategory::Validation,
            Self::IncompatibleSelection { .. } => ErrorCategory::Compatibility,
            Self::InvalidTemplateId { .. } => ErrorCategory::Internal,
        }
    }

    /// Whether this error describes a rejected configuration record.
    pub fn is_invalid_configuration(&self) -> bool {
        !matches!(self, Self::InvalidTemplateId { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Compatibility,
    NotFound,
    Internal,
}
