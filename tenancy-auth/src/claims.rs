//! JWT claims and the request principal
//!
//! [`IdentityClaims`] is the wire payload of a bearer token. [`Principal`] is
//! the typed identity handed to the access-control and directory layers; it
//! can only be obtained from claims whose signature and expiry were verified.

use crate::error::{AuthError, AuthResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tenancy_org::Role;
use uuid::Uuid;

/// Claims carried by a bearer token.
///
/// # Example
///
/// ```rust,no_run
/// use tenancy_auth::claims::IdentityClaims;
/// use tenancy_org::Role;
/// use uuid::Uuid;
///
/// let claims = IdentityClaims::new(
///     Uuid::now_v7(),
///     Uuid::now_v7(),
///     Role::Member,
///     chrono::Duration::hours(24),
/// )
/// .unwrap();
/// assert!(!claims.is_expired());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityClaims {
    /// User ID
    pub user_id: Uuid,

    /// Organization the token is scoped to
    pub organization_id: Uuid,

    /// Role within that organization
    pub role: Role,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl IdentityClaims {
    /// Default issuer for tokens minted by this crate.
    pub const DEFAULT_ISSUER: &'static str = "tenancy";

    /// Create claims valid for `duration` from now.
    ///
    /// # Errors
    ///
    /// Returns `Signing` if the expiry falls outside the representable
    /// date range.
    pub fn new(
        user_id: Uuid,
        organization_id: Uuid,
        role: Role,
        duration: Duration,
    ) -> AuthResult<Self> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(duration)
            .ok_or_else(|| AuthError::Signing("Token expiry out of range".to_string()))?;

        Ok(Self {
            user_id,
            organization_id,
            role,
            iss: Self::DEFAULT_ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// Set the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = issuer.into();
        self
    }

    /// Check if the token is expired. A token is expired at its expiry instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check expiry against an explicit instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Get expiration as DateTime.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }

    /// Get issue time as DateTime.
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }
}

/// The authenticated caller of a request.
///
/// There is no public constructor: a principal only comes out of
/// [`TokenService::authenticate`](crate::TokenService::authenticate) or
/// [`Authenticator::authenticate`](crate::Authenticator::authenticate), after
/// the token's signature and expiry were verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: Uuid,
    organization_id: Uuid,
    role: Role,
    expires_at: DateTime<Utc>,
}

impl Principal {
    #[cfg_attr(not(feature = "jwt"), allow(dead_code))]
    pub(crate) fn from_verified(claims: &IdentityClaims) -> Self {
        Self {
            user_id: claims.user_id,
            organization_id: claims.organization_id,
            role: claims.role,
            expires_at: claims.expires_at(),
        }
    }

    /// The caller's user ID.
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// The only organization the caller may act in.
    pub fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    /// The caller's role within its organization.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Check if the caller is an admin of its organization.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Check if the caller is the given user.
    pub fn is_user(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Check if the caller belongs to the given organization.
    pub fn in_organization(&self, organization_id: Uuid) -> bool {
        self.organization_id == organization_id
    }

    /// When the token behind this principal expires.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}
