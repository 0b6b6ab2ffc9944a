//! Error types for directory operations

use crate::storage::StorageError;
use serde::{Deserialize, Serialize};
use tenancy_auth::AuthError;
use tenancy_org::OrgError;
use tenancy_rbac::AccessError;
use thiserror::Error;

/// Broad error categories a transport maps onto responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    Timeout,
    Internal,
}

/// Directory error types.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Input failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Token or header rejected
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// No principal was presented for an authenticated operation
    #[error("Authentication required")]
    Unauthenticated,

    /// Email and password did not match an account
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Principal lacks scope or role
    #[error("Forbidden: insufficient permissions")]
    Forbidden,

    /// User is absent, deleted, or outside the caller's organization
    #[error("User not found")]
    UserNotFound,

    /// Organization is absent, deleted, or outside the caller's organization
    #[error("Organization not found")]
    OrganizationNotFound,

    /// Organization exists but is deactivated
    #[error("Organization is not active")]
    OrganizationInactive,

    /// Email already registered in the organization
    #[error("Email already registered in this organization")]
    DuplicateEmail,

    /// Organization name already taken
    #[error("Organization name already exists")]
    DuplicateOrganizationName,

    /// The change would leave the organization without an admin
    #[error("Organization must keep at least one admin")]
    LastAdmin,

    /// A multi-write operation was rolled back
    #[error("Operation rolled back: {source}")]
    Rollback {
        /// What caused the rollback
        #[source]
        source: Box<DirectoryError>,
    },

    /// A storage call exceeded its deadline
    #[error("Storage call '{operation}' timed out")]
    Timeout {
        /// The storage call that timed out
        operation: &'static str,
    },

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

impl DirectoryError {
    /// Wrap an error as the cause of a rollback.
    pub fn rollback(source: DirectoryError) -> Self {
        DirectoryError::Rollback {
            source: Box::new(source),
        }
    }

    /// Get the error category.
    ///
    /// A rollback reports the category of its cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DirectoryError::Validation(_) | DirectoryError::OrganizationInactive => {
                ErrorKind::Validation
            }
            DirectoryError::Auth(e) if e.is_unauthenticated() => ErrorKind::Unauthenticated,
            DirectoryError::Auth(AuthError::EmptyInput) => ErrorKind::Validation,
            DirectoryError::Auth(_) => ErrorKind::Internal,
            DirectoryError::Unauthenticated | DirectoryError::InvalidCredentials => {
                ErrorKind::Unauthenticated
            }
            DirectoryError::Forbidden => ErrorKind::Forbidden,
            DirectoryError::UserNotFound | DirectoryError::OrganizationNotFound => {
                ErrorKind::NotFound
            }
            DirectoryError::DuplicateEmail
            | DirectoryError::DuplicateOrganizationName
            | DirectoryError::LastAdmin => ErrorKind::Conflict,
            DirectoryError::Rollback { source } => source.kind(),
            DirectoryError::Timeout { .. } => ErrorKind::Timeout,
            DirectoryError::Storage(StorageError::Conflict(_)) => ErrorKind::Conflict,
            DirectoryError::Storage(StorageError::NotFound(_)) => ErrorKind::NotFound,
            DirectoryError::Storage(_) | DirectoryError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Internal | ErrorKind::Timeout)
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Timeout => 504,
            ErrorKind::Internal => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            DirectoryError::Validation(_) => "VALIDATION_ERROR",
            DirectoryError::Auth(e) => e.error_code(),
            DirectoryError::Unauthenticated => "UNAUTHENTICATED",
            DirectoryError::InvalidCredentials => "INVALID_CREDENTIALS",
            DirectoryError::Forbidden => "FORBIDDEN",
            DirectoryError::UserNotFound => "USER_NOT_FOUND",
            DirectoryError::OrganizationNotFound => "ORGANIZATION_NOT_FOUND",
            DirectoryError::OrganizationInactive => "ORGANIZATION_INACTIVE",
            DirectoryError::DuplicateEmail => "DUPLICATE_EMAIL",
            DirectoryError::DuplicateOrganizationName => "DUPLICATE_ORGANIZATION_NAME",
            DirectoryError::LastAdmin => "LAST_ADMIN",
            DirectoryError::Rollback { source } => source.error_code(),
            DirectoryError::Timeout { .. } => "TIMEOUT",
            DirectoryError::Storage(StorageError::Conflict(_)) => "CONFLICT",
            DirectoryError::Storage(_) => "STORAGE_ERROR",
            DirectoryError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// A message that is safe to show the caller.
    ///
    /// Server-side failures collapse to a generic message; their detail
    /// only goes to the logs.
    pub fn client_message(&self) -> String {
        match self {
            DirectoryError::Rollback { source } => return source.client_message(),
            DirectoryError::Storage(StorageError::Conflict(_)) => {
                return "Resource already exists".to_string()
            }
            DirectoryError::Storage(StorageError::NotFound(_)) => return "Not found".to_string(),
            DirectoryError::Auth(AuthError::MalformedToken(_)) => {
                return "Malformed token".to_string()
            }
            _ => {}
        }

        match self.kind() {
            ErrorKind::Timeout => "Request timed out".to_string(),
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<OrgError> for DirectoryError {
    fn from(err: OrgError) -> Self {
        DirectoryError::Validation(err.message().to_string())
    }
}

impl From<AccessError> for DirectoryError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthenticated => DirectoryError::Unauthenticated,
            AccessError::Forbidden => DirectoryError::Forbidden,
        }
    }
}
