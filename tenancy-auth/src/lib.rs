//! # Tenancy Authentication
//!
//! This crate provides credential verification and organization-scoped
//! bearer tokens for the tenancy core.
//!
//! ## Overview
//!
//! The tenancy-auth crate handles:
//! - **Passwords**: Argon2id hashing with a unique salt per hash
//! - **JWT**: HS256 token issuance and validation with identity and tenancy claims
//! - **Principal**: The typed, verified caller identity threaded through requests
//! - **Bearer extraction**: `Authorization: Bearer <token>` parsing
//!
//! ## Features
//!
//! - `jwt` (default): Token service using jsonwebtoken
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tenancy_auth::{PasswordConfig, PasswordHasher, TokenConfig, TokenService};
//! use tenancy_org::Role;
//! use uuid::Uuid;
//!
//! let hasher = PasswordHasher::new(PasswordConfig::default()).unwrap();
//! let digest = hasher.hash("secret1").unwrap();
//! assert!(hasher.verify(&digest, "secret1"));
//!
//! let tokens = TokenService::new(TokenConfig::new("your-secret-key")).unwrap();
//! let token = tokens.issue(Uuid::now_v7(), Uuid::now_v7(), Role::Member).unwrap();
//! let principal = tokens.authenticate(&token).unwrap();
//! assert!(!principal.is_admin());
//! ```
//!
//! ## Claims Structure
//!
//! Tokens carry `user_id`, `organization_id`, `role`, `iss`, `iat` and `exp`.
//! Tokens are stateless and never revoked; expiry is the only way a token
//! stops working.

pub mod bearer;
pub mod claims;
pub mod error;
#[cfg(feature = "jwt")]
pub mod jwt;
pub mod password;

// Re-export main types
pub use bearer::extract_bearer;
pub use claims::{IdentityClaims, Principal};
pub use error::{AuthError, AuthResult};
pub use password::{PasswordConfig, PasswordHasher};

#[cfg(feature = "jwt")]
pub use bearer::Authenticator;
#[cfg(feature = "jwt")]
pub use jwt::{IssuedToken, TokenConfig, TokenService};
