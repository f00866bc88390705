//! Unified error handling for forgekit core.
//!
//! [`ForgeError`] wraps domain and application errors and adds the
//! generation-failure envelope that carries the failed step and the rollback
//! outcome next to the error that triggered it.

use thiserror::Error;

use crate::application::{ApplicationError, GenerationStep, RollbackOutcome};
use crate::domain::DomainError;

/// Root error type for forgekit core operations.
#[derive(Debug, Error, Clone)]
pub enum ForgeError {
    /// The configuration record was rejected.
    #[error("Invalid configuration: {0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (I/O, templates, rollback).
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// A generation step failed and the ledger was rolled back.
    #[error("Generation failed during '{}': {}", .0.step, .0.error)]
    GenerationFailed(#[source] Box<GenerationFailure>),

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

/// Failure envelope produced by the generator.
///
/// `error` is always the error that stopped the pipeline; rollback problems
/// are reported through `rollback` and never replace it.
#[derive(Debug, Clone, Error)]
#[error("step '{step}' failed: {error}")]
pub struct GenerationFailure {
    pub step: GenerationStep,
    #[source]
    pub error: ForgeError,
    pub rollback: RollbackOutcome,
}

impl ForgeError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::GenerationFailed(failure) => {
                let mut out = failure.error.suggestions();
                if let Err(partial) = failure.rollback.clone().into_result() {
                    out.extend(partial.suggestions());
                }
                out
            }
            Self::Internal { .. } => vec![
                "This appears to be a bug in forgekit".into(),
                "Please report this issue at: https://github.com/cosecruz/forgekit/issues".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::Compatibility => ErrorCategory::Compatibility,
                crate::domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
                crate::domain::ErrorCategory::Internal => ErrorCategory::Internal,
            },
            Self::Application(e) => e.category(),
            Self::GenerationFailed(failure) => failure.error.category(),
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// The error that actually stopped the operation, looking through the
    /// generation-failure envelope.
    pub fn root_cause(&self) -> &ForgeError {
        match self {
            Self::GenerationFailed(failure) => failure.error.root_cause(),
            other => other,
        }
    }

    /// Whether the configuration record was rejected.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self.root_cause(), Self::Domain(e) if e.is_invalid_configuration())
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::Application(ApplicationError::StoreLockError)
        )
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Compatibility,
    NotFound,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type ForgeResult<T> = Result<T, ForgeError>;
