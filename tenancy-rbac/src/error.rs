//! Access control errors

use thiserror::Error;

/// Why a request was refused.
///
/// The two variants are kept distinct so a transport can answer 401 and 403
/// respectively. `Forbidden` never says whether the organization or the role
/// was wrong.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AccessError {
    /// No verified identity was presented
    #[error("Authentication required")]
    Unauthenticated,

    /// Identity is valid but lacks scope or role for the operation
    #[error("Forbidden: insufficient permissions")]
    Forbidden,
}

/// Result type for access checks.
pub type AccessResult<T> = Result<T, AccessError>;

impl AccessError {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AccessError::Unauthenticated => 401,
            AccessError::Forbidden => 403,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AccessError::Unauthenticated => "UNAUTHENTICATED",
            AccessError::Forbidden => "FORBIDDEN",
        }
    }
}
