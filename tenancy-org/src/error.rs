//! Error types for domain validation
//!
//! Input that fails these checks is rejected before any business rule or
//! storage call runs.

use thiserror::Error;

/// Domain validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrgError {
    /// Input failed validation
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Result type for domain operations.
pub type OrgResult<T> = Result<T, OrgError>;

impl OrgError {
    /// Shorthand for building a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        OrgError::Validation(message.into())
    }

    /// The caller-facing message without the error prefix.
    pub fn message(&self) -> &str {
        match self {
            OrgError::Validation(message) => message,
        }
    }
}
