//! Bearer token extraction
//!
//! The transport side of authentication: pull the token out of an
//! `Authorization: Bearer <token>` header and turn it into a [`Principal`].

use crate::error::{AuthError, AuthResult};

#[cfg(feature = "jwt")]
use crate::{claims::Principal, jwt::TokenService};
#[cfg(feature = "jwt")]
use std::sync::Arc;

/// Authentication scheme accepted in the `Authorization` header.
pub const BEARER_SCHEME: &str = "Bearer";

/// Extract the token from an `Authorization` header value.
///
/// # Examples
///
/// ```
/// use tenancy_auth::bearer::extract_bearer;
///
/// assert_eq!(extract_bearer("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
/// assert!(extract_bearer("Basic dXNlcjpwYXNz").is_err());
/// ```
pub fn extract_bearer(header: &str) -> AuthResult<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER_SCHEME), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidAuthorizationHeader),
    }
}

/// Resolves the `Authorization` header of a request into a principal.
///
/// Cloning is cheap; the token service is shared.
#[cfg(feature = "jwt")]
#[derive(Debug, Clone)]
pub struct Authenticator {
    tokens: Arc<TokenService>,
}

#[cfg(feature = "jwt")]
impl Authenticator {
    /// Create an authenticator backed by the given token service.
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Authenticate a request from its `Authorization` header.
    ///
    /// # Errors
    ///
    /// - `MissingCredentials` if there is no header
    /// - `InvalidAuthorizationHeader` if it is not `Bearer <token>`
    /// - any token validation error
    pub fn authenticate(&self, authorization: Option<&str>) -> AuthResult<Principal> {
        let header = authorization.ok_or(AuthError::MissingCredentials)?;
        let token = extract_bearer(header).inspect_err(|_| {
            tracing::warn!("Invalid Authorization format");
        })?;

        self.tokens.authenticate(token).inspect_err(|e| {
            tracing::warn!(error_code = e.error_code(), "Rejected bearer token");
        })
    }

    /// The token service used for validation.
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}
