//! Error types for authentication operations
//!
//! This module defines all error types that can occur during password
//! hashing, token issuance, token validation and bearer extraction.

use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Plaintext password was empty
    #[error("Password must not be empty")]
    EmptyInput,

    /// Token could not be signed
    #[error("Token signing failed: {0}")]
    Signing(String),

    /// Signature did not verify, or the token used an unexpected algorithm
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token is at or past its expiry
    #[error("Token has expired")]
    ExpiredToken,

    /// Token is structurally invalid
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// No credentials were presented
    #[error("Missing Authorization header")]
    MissingCredentials,

    /// Authorization header is not `Bearer <token>`
    #[error("Invalid Authorization format")]
    InvalidAuthorizationHeader,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// Rejected tokens are expected and should not be logged as errors.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            AuthError::Signing(_) | AuthError::ConfigError(_) | AuthError::Internal(_)
        )
    }

    /// Check if this error means the caller is not authenticated.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidSignature
                | AuthError::ExpiredToken
                | AuthError::MalformedToken(_)
                | AuthError::MissingCredentials
                | AuthError::InvalidAuthorizationHeader
        )
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidSignature
            | AuthError::ExpiredToken
            | AuthError::MalformedToken(_)
            | AuthError::MissingCredentials
            | AuthError::InvalidAuthorizationHeader => 401,

            AuthError::EmptyInput => 400,

            AuthError::Signing(_) | AuthError::ConfigError(_) | AuthError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::EmptyInput => "EMPTY_INPUT",
            AuthError::Signing(_) => "SIGNING_ERROR",
            AuthError::InvalidSignature => "INVALID_SIGNATURE",
            AuthError::ExpiredToken => "TOKEN_EXPIRED",
            AuthError::MalformedToken(_) => "MALFORMED_TOKEN",
            AuthError::MissingCredentials => "MISSING_CREDENTIALS",
            AuthError::InvalidAuthorizationHeader => "INVALID_AUTHORIZATION_HEADER",
            AuthError::ConfigError(_) => "CONFIG_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_failures_are_unauthenticated() {
        for err in [
            AuthError::InvalidSignature,
            AuthError::ExpiredToken,
            AuthError::MalformedToken("x".into()),
            AuthError::MissingCredentials,
        ] {
            assert!(err.is_unauthenticated());
            assert_eq!(err.status_code(), 401);
            assert!(!err.is_server_error());
        }
    }

    #[test]
    fn test_signing_failure_is_server_error() {
        let err = AuthError::Signing("boom".into());
        assert!(err.is_server_error());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "SIGNING_ERROR");
    }
}
