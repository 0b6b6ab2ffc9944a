//! # Tenancy RBAC (Role-Based Access Control)
//!
//! This crate decides whether a verified caller may perform an operation
//! against a user or an organization.
//!
//! ## Overview
//!
//! The tenancy-rbac crate handles:
//! - **Operations**: Everything the directory can be asked to do
//! - **Targets**: The user or organization an operation acts on
//! - **Policy**: The organization-scope and role rules
//!
//! ## Architecture
//!
//! ```text
//! Decision = Scope(principal.org == target.org) AND Role(operation, principal)
//!
//! Examples:
//!   admin of A  + delete_user(user in A)         -> allow
//!   admin of A  + delete_user(user in B)         -> deny
//!   member of A + update_user(itself)            -> allow
//!   member of A + list_organization_users(A)     -> deny
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tenancy_auth::TokenService;
//! use tenancy_org::Role;
//! use tenancy_rbac::{AccessControl, AccessError, Operation, Target};
//! use uuid::Uuid;
//!
//! let tokens = TokenService::with_secret("secret").unwrap();
//! let org_id = Uuid::now_v7();
//! let user_id = Uuid::now_v7();
//! let token = tokens.issue(user_id, org_id, Role::Member).unwrap();
//! let member = tokens.authenticate(&token).unwrap();
//!
//! // A member may update itself
//! AccessControl::authorize(Some(&member), Operation::UpdateUser, &Target::user(user_id, org_id))
//!     .unwrap();
//!
//! // but not change its own role
//! let denied = AccessControl::authorize(
//!     Some(&member),
//!     Operation::ChangeUserRole,
//!     &Target::user(user_id, org_id),
//! );
//! assert_eq!(denied, Err(AccessError::Forbidden));
//! ```
//!
//! ## Integration with tenancy-auth
//!
//! Decisions are made over [`tenancy_auth::Principal`], which can only be
//! obtained from a verified token. An unverified claim set cannot reach
//! the evaluator.

pub mod error;
pub mod operation;
pub mod policy;
pub mod target;

// Re-export main types for convenience
pub use error::{AccessError, AccessResult};
pub use operation::Operation;
pub use policy::{AccessControl, AccessDecision};
pub use target::{Target, TargetKind};
