//! Application layer errors.
//!
//! These errors represent failures in orchestration and I/O, not in the
//! configuration record. Configuration errors are `DomainError` from
//! `crate::domain`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur while rendering, assembling and rolling back.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// A template file identity does not exist in the template source.
    #[error("template not found: {id}")]
    TemplateNotFound { id: String },

    /// A template directory identity does not exist in the template source.
    #[error("template directory not found: {id}")]
    TemplateDirectoryNotFound { id: String },

    /// A manifest template rendered to something that is not a JSON object.
    #[error("malformed manifest '{template}': {reason}")]
    MalformedManifest { template: String, reason: String },

    /// The template engine rejected a template.
    #[error("failed to render '{template}': {reason}")]
    RenderingFailed { template: String, reason: String },

    /// Filesystem operation failed. The I/O error is kept as the source.
    #[error("failed to {operation} '{}': {source}", path.display())]
    FilesystemError {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: Arc<io::Error>,
    },

    /// Rollback could not remove every tracked path.
    #[error("rollback left {} path(s) behind", remaining.len())]
    RollbackPartialFailure {
        remaining: Vec<PathBuf>,
        causes: Vec<String>,
    },

    /// Project already exists at target location.
    #[error("Project already exists at {path}")]
    ProjectExists { path: PathBuf },

    /// Shared state access failed (lock poisoned).
    #[error("Internal store lock poisoned")]
    StoreLockError,

    /// An external program could not be started.
    #[error("failed to run `{command}`: {reason}")]
    CommandFailed { command: String, reason: String },
}

impl ApplicationError {
    /// Wrap an I/O error with the path and the operation that failed.
    pub fn filesystem(path: &Path, operation: &'static str, source: io::Error) -> Self {
        Self::FilesystemError {
            path: path.to_path_buf(),
            operation,
            source: Arc::new(source),
        }
    }

    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TemplateNotFound { id } | Self::TemplateDirectoryNotFound { id } => vec![
                format!("The template tree has no entry '{id}'"),
                "Check --templates / templates.local_path points at a complete tree".into(),
                "Omit --templates to use the built-in templates".into(),
            ],
            Self::MalformedManifest { template, .. } => vec![
                format!("'{template}' must render to a JSON object"),
                "Check the template for trailing commas or unbalanced conditionals".into(),
            ],
            Self::RenderingFailed { template, .. } => vec![
                format!("Fix the template syntax in '{template}'"),
                "Run with -vv to see the full engine error".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
                "Check available disk space".into(),
            ],
            Self::RollbackPartialFailure { remaining, .. } => {
                let mut out = vec!["Remove these leftovers manually:".to_string()];
                out.extend(remaining.iter().map(|p| format!("  • {}", p.display())));
                out
            }
            Self::ProjectExists { path } => vec![
                format!("Directory already exists and is not empty: {}", path.display()),
                "Use --force to generate into it anyway".into(),
                "Choose a different project name".into(),
            ],
            Self::StoreLockError => vec!["Try again in a moment".into()],
            Self::CommandFailed { command, .. } => vec![
                format!("Ensure `{command}` is installed and in your PATH"),
                "Re-run with --skip-install to generate without installing".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TemplateNotFound { .. } | Self::TemplateDirectoryNotFound { .. } => {
                ErrorCategory::NotFound
            }
            Self::MalformedManifest { .. } | Self::RenderingFailed { .. } => {
                ErrorCategory::Configuration
            }
            Self::ProjectExists { .. } => ErrorCategory::Validation,
            Self::FilesystemError { .. }
            | Self::RollbackPartialFailure { .. }
            | Self::StoreLockError
            | Self::CommandFailed { .. } => ErrorCategory::Internal,
        }
    }
}
